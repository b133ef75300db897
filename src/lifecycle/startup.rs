//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the metadata resolver selected by configuration
//! - Construct the process-wide resolution cache and the pipeline around it
//!
//! # Design Decisions
//! - Fail fast: an unusable metadata endpoint is a startup error
//! - One cache per process, created here and passed down explicitly

use std::sync::Arc;

use crate::config::{MetadataSource, ServiceConfig};
use crate::metadata::{HttpTagSource, MetadataResolver, ResolutionResult, StaticTagSource, TagResolver};
use crate::redirect::{RedirectPipeline, ResolutionCache};

/// Resolver for the configured tag source.
pub fn build_resolver(config: &ServiceConfig) -> ResolutionResult<Arc<dyn MetadataResolver>> {
    let metadata = &config.metadata;
    let resolver: Arc<dyn MetadataResolver> = match metadata.source {
        MetadataSource::Http => {
            let source = HttpTagSource::from_config(metadata)?;
            tracing::info!(endpoint = %source.endpoint(), "Using HTTP metadata source");
            Arc::new(TagResolver::with_key(source, &metadata.partition, &metadata.tag_key))
        }
        MetadataSource::Static => {
            let source = StaticTagSource::from_config(&metadata.static_tags);
            tracing::info!(distributions = source.len(), "Using static metadata source");
            Arc::new(TagResolver::with_key(source, &metadata.partition, &metadata.tag_key))
        }
    };
    Ok(resolver)
}

/// Pipeline with a fresh cache around the configured resolver.
pub fn build_pipeline(config: &ServiceConfig) -> ResolutionResult<RedirectPipeline> {
    let resolver = build_resolver(config)?;
    let cache = ResolutionCache::new(resolver, config.redirect.cache_policy());
    let options = config.redirect.pipeline_options();

    tracing::info!(
        deadline_ms = config.redirect.timeout_ms,
        on_resolution_error = ?options.on_resolution_error,
        retain_failed_resolutions = config.redirect.retain_failed_resolutions,
        "Redirect pipeline ready"
    );
    Ok(RedirectPipeline::new(cache, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{DistributionIdentity, RequestContext, ResponseEnvelope};

    #[tokio::test]
    async fn test_static_pipeline() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [metadata]
            source = "static"
            [metadata.static_tags.D1]
            FallbackLocation = "https://@host@/fallback?from=@path@"
            "#,
        )
        .unwrap();
        let pipeline = build_pipeline(&config).unwrap();

        let request = RequestContext {
            method: "GET".to_string(),
            path: "/gone".to_string(),
            query_string: String::new(),
            host: "www.example.org".to_string(),
        };
        let response = ResponseEnvelope {
            status: "404".to_string(),
            status_description: None,
            body: None,
            headers: Default::default(),
        };

        let out = pipeline
            .handle_response(&request, &DistributionIdentity::new("1", "D1"), response)
            .await
            .unwrap();
        assert_eq!(out.header("location"), Some("https://www.example.org/fallback?from=/gone"));
    }

    #[test]
    fn test_invalid_endpoint_fails_startup() {
        let mut config = ServiceConfig::default();
        config.metadata.endpoint = "not a url".to_string();
        assert!(build_pipeline(&config).is_err());
    }
}
