//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable through `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Writes to stderr; stdout carries the `invoke` command's response JSON

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Filter directive for the configured level, scoped to this crate.
pub fn default_directive(log_level: &str) -> String {
    format!("fallback_redirect={log_level},tower_http={log_level}")
}

/// Install the global subscriber, writing to stderr. Later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    if build_subscriber(config, std::io::stderr).try_init().is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Subscriber for `config` that writes formatted events to `writer`.
pub fn build_subscriber<W>(config: &ObservabilityConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => Box::new(registry.with(tracing_subscriber::fmt::layer().json().with_writer(writer))),
        LogFormat::Pretty => Box::new(registry.with(tracing_subscriber::fmt::layer().with_writer(writer))),
    }
}
