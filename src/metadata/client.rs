//! Tag sources: the metadata service over HTTP, and a static table from config.
//!
//! # Responsibilities
//! - Issue exactly one tag listing call per lookup
//! - Bound each call with its own timeout
//! - Map transport, status and decoding failures to [`ResolutionError`]
//!
//! Credentials are not managed here: the HTTP source sends an optional bearer
//! token that the platform provides through the environment.

use futures_util::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::schema::MetadataConfig;
use crate::metadata::resolver::TagSource;
use crate::metadata::types::{ResolutionError, ResolutionResult, Tag, TagListing};
use crate::observability::metrics;

/// Lists tags from the metadata service endpoint.
///
/// Sends `GET <endpoint>?Resource=<arn>` and expects a [`TagListing`] body.
#[derive(Clone)]
pub struct HttpTagSource {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
    timeout_secs: u64,
}

impl HttpTagSource {
    /// Create a tag source for `endpoint`.
    pub fn new(endpoint: &str, timeout_secs: u64, token: Option<String>) -> ResolutionResult<Self> {
        let endpoint: Url = endpoint.parse().map_err(|e| {
            ResolutionError::Transport(format!("Invalid metadata endpoint '{}': {}", endpoint, e))
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ResolutionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token,
            timeout_secs,
        })
    }

    /// Create a tag source from configuration, reading the token from the
    /// configured environment variable if it is set.
    pub fn from_config(config: &MetadataConfig) -> ResolutionResult<Self> {
        let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::debug!(token_env = %config.token_env, "No metadata token in environment");
        }
        Self::new(&config.endpoint, config.request_timeout_secs, token)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl TagSource for HttpTagSource {
    fn list_tags(&self, resource: &str) -> BoxFuture<'static, ResolutionResult<Vec<Tag>>> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("Resource", resource);

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let timeout_secs = self.timeout_secs;
        let resource = resource.to_string();

        async move {
            metrics::record_resolver_call();

            // Bounds the body read as well as the response headers.
            match timeout(Duration::from_secs(timeout_secs), fetch_tags(request, &resource)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(resource = %resource, timeout_secs, "Metadata request timed out");
                    Err(ResolutionError::Timeout(timeout_secs))
                }
            }
        }
        .boxed()
    }
}

async fn fetch_tags(request: reqwest::RequestBuilder, resource: &str) -> ResolutionResult<Vec<Tag>> {
    let response = request.send().await.map_err(|e| {
        tracing::warn!(resource = %resource, error = %e, "Metadata request failed");
        ResolutionError::Transport(e.to_string())
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ResolutionError::ResourceNotFound(resource.to_string()));
    }
    if !status.is_success() {
        return Err(ResolutionError::Status {
            status: status.as_u16(),
            resource: resource.to_string(),
        });
    }

    let listing: TagListing = response
        .json()
        .await
        .map_err(|e| ResolutionError::Decode(e.to_string()))?;

    tracing::debug!(resource = %resource, tags = listing.tags.items.len(), "Metadata tags received");
    Ok(listing.tags.items)
}

impl std::fmt::Debug for HttpTagSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTagSource")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_token", &self.token.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Tags held in memory, keyed by distribution id.
#[derive(Debug, Clone, Default)]
pub struct StaticTagSource {
    tags: Arc<HashMap<String, Vec<Tag>>>,
}

impl StaticTagSource {
    pub fn new(tags: HashMap<String, Vec<Tag>>) -> Self {
        Self { tags: Arc::new(tags) }
    }

    /// Build from the `[metadata.static_tags]` table.
    pub fn from_config(static_tags: &BTreeMap<String, BTreeMap<String, String>>) -> Self {
        let tags = static_tags
            .iter()
            .map(|(distribution, tags)| {
                let tags = tags
                    .iter()
                    .map(|(key, value)| Tag::new(key.clone(), value.clone()))
                    .collect();
                (distribution.clone(), tags)
            })
            .collect();
        Self::new(tags)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TagSource for StaticTagSource {
    fn list_tags(&self, resource: &str) -> BoxFuture<'static, ResolutionResult<Vec<Tag>>> {
        metrics::record_resolver_call();

        // Resources are `...:distribution/<id>`, see `distribution_arn`.
        let distribution_id = resource.rsplit('/').next().unwrap_or(resource);
        let result = self
            .tags
            .get(distribution_id)
            .cloned()
            .ok_or_else(|| ResolutionError::ResourceNotFound(resource.to_string()));

        futures_util::future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_rejected() {
        let err = HttpTagSource::new("not a url", 5, None).unwrap_err();
        assert!(err.to_string().contains("Invalid metadata endpoint"));
    }

    #[tokio::test]
    async fn test_static_source_lookup() {
        let mut table = BTreeMap::new();
        table.insert(
            "D12345".to_string(),
            BTreeMap::from([("FallbackLocation".to_string(), "/home".to_string())]),
        );
        let source = StaticTagSource::from_config(&table);
        assert_eq!(source.len(), 1);

        let tags = source
            .list_tags("arn:aws:cloudfront::1:distribution/D12345")
            .await
            .unwrap();
        assert_eq!(tags, vec![Tag::new("FallbackLocation", "/home")]);
    }

    #[tokio::test]
    async fn test_static_source_unknown_distribution() {
        let source = StaticTagSource::default();
        let err = source
            .list_tags("arn:aws:cloudfront::1:distribution/DNOPE")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::ResourceNotFound("arn:aws:cloudfront::1:distribution/DNOPE".to_string())
        );
    }

    #[tokio::test]
    async fn test_static_source_reads_id_from_distribution_arn() {
        let table = BTreeMap::from([(
            "D12345".to_string(),
            BTreeMap::from([("FallbackLocation".to_string(), "/home".to_string())]),
        )]);
        let source = StaticTagSource::from_config(&table);

        let resource = crate::metadata::types::distribution_arn("aws-cn", "123456789012", "D12345");
        let tags = source.list_tags(&resource).await.unwrap();
        assert_eq!(tags, vec![Tag::new("FallbackLocation", "/home")]);
    }
}
