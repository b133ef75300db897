//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadline below the platform limit, non-zero timeouts)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{MetadataSource, ServiceConfig, PLACEHOLDER_API_KEY};
use crate::event::types::account_id_from_arn;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }

    let redirect = &config.redirect;
    if redirect.timeout_ms == 0 {
        errors.push(ValidationError::new("redirect.timeout_ms", "must be greater than 0"));
    } else if redirect.timeout_ms >= redirect.platform_limit_ms {
        errors.push(ValidationError::new(
            "redirect.timeout_ms",
            format!(
                "{} ms must stay below the platform limit of {} ms",
                redirect.timeout_ms, redirect.platform_limit_ms
            ),
        ));
    }

    let metadata = &config.metadata;
    if metadata.tag_key.is_empty() {
        errors.push(ValidationError::new("metadata.tag_key", "must not be empty"));
    }
    if metadata.partition.is_empty() {
        errors.push(ValidationError::new("metadata.partition", "must not be empty"));
    }
    if metadata.source == MetadataSource::Http {
        if let Err(e) = metadata.endpoint.parse::<Url>() {
            errors.push(ValidationError::new(
                "metadata.endpoint",
                format!("'{}' is not a valid URL: {}", metadata.endpoint, e),
            ));
        }
        if metadata.request_timeout_secs == 0 {
            errors.push(ValidationError::new("metadata.request_timeout_secs", "must be greater than 0"));
        }
    }

    if let Some(arn) = &config.invocation.function_arn {
        if account_id_from_arn(arn).is_err() {
            errors.push(ValidationError::new(
                "invocation.function_arn",
                format!("cannot derive an account id from '{}'", arn),
            ));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if config.admin.enabled && (config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_API_KEY) {
        errors.push(ValidationError::new("admin.api_key", "must be set when the admin API is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
