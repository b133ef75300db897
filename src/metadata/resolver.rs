//! Fallback location lookup from distribution tags.

use futures_util::future::{BoxFuture, FutureExt};

use crate::metadata::types::{distribution_arn, ResolutionResult, Tag, FALLBACK_LOCATION_TAG};

/// Something that can list the tags attached to a resource.
pub trait TagSource: Send + Sync + 'static {
    /// Fetch all tags for `resource`. Exactly one outbound call per invocation.
    fn list_tags(&self, resource: &str) -> BoxFuture<'static, ResolutionResult<Vec<Tag>>>;
}

/// Resolves the fallback location template of a distribution.
///
/// `Ok(None)` means the distribution has no fallback location; that is not an
/// error. Implementations do not retry and do not memoize; see
/// [`ResolutionCache`](crate::redirect::ResolutionCache) for that.
pub trait MetadataResolver: Send + Sync + 'static {
    fn resolve(
        &self,
        account_id: &str,
        distribution_id: &str,
    ) -> BoxFuture<'static, ResolutionResult<Option<String>>>;
}

/// Resolver reading one tag key from a [`TagSource`].
#[derive(Debug, Clone)]
pub struct TagResolver<S> {
    source: S,
    partition: String,
    tag_key: String,
}

impl<S: TagSource> TagResolver<S> {
    /// Resolver for the `FallbackLocation` tag in the `aws` partition.
    pub fn new(source: S) -> Self {
        Self::with_key(source, "aws", FALLBACK_LOCATION_TAG)
    }

    pub fn with_key(source: S, partition: impl Into<String>, tag_key: impl Into<String>) -> Self {
        Self {
            source,
            partition: partition.into(),
            tag_key: tag_key.into(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: TagSource> MetadataResolver for TagResolver<S> {
    fn resolve(
        &self,
        account_id: &str,
        distribution_id: &str,
    ) -> BoxFuture<'static, ResolutionResult<Option<String>>> {
        let resource = distribution_arn(&self.partition, account_id, distribution_id);
        tracing::debug!(resource = %resource, tag_key = %self.tag_key, "Fetching distribution tags");

        let tags = self.source.list_tags(&resource);
        let tag_key = self.tag_key.clone();

        async move {
            let tags = tags.await?;
            // Later duplicates override earlier ones.
            Ok(tags
                .into_iter()
                .rev()
                .find(|tag| tag.key == tag_key)
                .map(|tag| tag.value))
        }
        .boxed()
    }
}
