//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline, cache, tag sources, HTTP layer produce:
//!     → logging.rs (structured log events, one span per invocation)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every redirect decision point logs a line
//! - Request ID flows from the HTTP layer into the invocation span
//! - Metrics are opt-in; the facade is free when no exporter is installed

pub mod logging;
pub mod metrics;
