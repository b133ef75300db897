//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirect_decisions_total` (counter): pipeline outcomes by `outcome`
//! - `redirect_decision_duration_seconds` (histogram): time spent in the pipeline
//! - `redirect_resolver_calls_total` (counter): outbound metadata calls
//! - `redirect_resolution_duration_seconds` (histogram): lookup latency by `result`
//! - `redirect_cache_entries` (gauge): cached distributions
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(outcome: &'static str, started: Instant) {
    counter!("redirect_decisions_total", "outcome" => outcome).increment(1);
    histogram!("redirect_decision_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_resolver_call() {
    counter!("redirect_resolver_calls_total").increment(1);
}

pub fn record_resolution(started: Instant, success: bool) {
    let result = if success { "ok" } else { "error" };
    histogram!("redirect_resolution_duration_seconds", "result" => result)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_cache_entries(entries: usize) {
    gauge!("redirect_cache_entries").set(entries as f64);
}
