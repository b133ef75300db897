//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::metadata::FALLBACK_LOCATION_TAG;
use crate::redirect::{CachePolicy, PipelineOptions, ResolutionErrorPolicy};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener for the invocation endpoint.
    pub server: ServerConfig,

    /// Redirect pipeline behaviour.
    pub redirect: RedirectConfig,

    /// Where fallback locations come from.
    pub metadata: MetadataConfig,

    /// Defaults for invocations that do not carry their own context.
    pub invocation: InvocationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed per HTTP request, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted event size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Redirect pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Deadline for producing a redirect, in milliseconds.
    pub timeout_ms: u64,

    /// Hard limit the platform puts on the invocation; `timeout_ms` must stay below it.
    pub platform_limit_ms: u64,

    /// What a failed metadata lookup does to the invocation.
    pub on_resolution_error: ResolutionErrorPolicy,

    /// Keep failed lookups cached until the cache is cleared.
    pub retain_failed_resolutions: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 25_000,
            platform_limit_ms: 30_000,
            on_resolution_error: ResolutionErrorPolicy::Propagate,
            retain_failed_resolutions: true,
        }
    }
}

impl RedirectConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            deadline: Duration::from_millis(self.timeout_ms),
            on_resolution_error: self.on_resolution_error,
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            retain_failures: self.retain_failed_resolutions,
        }
    }
}

/// Which tag source backs the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    /// Query the metadata service over HTTP.
    Http,
    /// Serve tags from `static_tags`.
    Static,
}

/// Metadata lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub source: MetadataSource,

    /// Tag listing endpoint (HTTP source only).
    pub endpoint: String,

    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,

    /// Environment variable holding the bearer token for the endpoint.
    pub token_env: String,

    /// Partition used when building resource identifiers.
    pub partition: String,

    /// Tag holding the fallback location template.
    pub tag_key: String,

    /// Distribution id → tags (static source only).
    pub static_tags: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            source: MetadataSource::Http,
            endpoint: "http://127.0.0.1:9000/tagging".to_string(),
            request_timeout_secs: 10,
            token_env: "FALLBACK_REDIRECT_METADATA_TOKEN".to_string(),
            partition: "aws".to_string(),
            tag_key: FALLBACK_LOCATION_TAG.to_string(),
            static_tags: BTreeMap::new(),
        }
    }
}

/// Invocation defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InvocationConfig {
    /// Function ARN used when a request does not supply one.
    pub function_arn: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

/// Placeholder key that validation refuses when the admin API is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.redirect.timeout_ms, 25_000);
        assert_eq!(config.metadata.tag_key, "FallbackLocation");
        assert_eq!(config.metadata.source, MetadataSource::Http);
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_full_config() {
        let raw = r#"
            [server]
            bind_address = "127.0.0.1:3000"

            [redirect]
            timeout_ms = 500
            on_resolution_error = "pass_through"
            retain_failed_resolutions = false

            [metadata]
            source = "static"

            [metadata.static_tags.EDFDVBD6EXAMPLE]
            FallbackLocation = "https://www.example.org@path@"

            [observability]
            log_format = "json"
        "#;
        let config: ServiceConfig = toml::from_str(raw).unwrap();

        let options = config.redirect.pipeline_options();
        assert_eq!(options.deadline, Duration::from_millis(500));
        assert_eq!(options.on_resolution_error, ResolutionErrorPolicy::PassThrough);
        assert!(!config.redirect.cache_policy().retain_failures);
        assert_eq!(config.metadata.source, MetadataSource::Static);
        assert_eq!(
            config.metadata.static_tags["EDFDVBD6EXAMPLE"]["FallbackLocation"],
            "https://www.example.org@path@"
        );
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
