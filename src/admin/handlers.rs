use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::redirect::{CacheEntrySummary, ResolutionErrorPolicy};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub cached_distributions: usize,
    pub deadline_ms: u64,
    pub on_resolution_error: ResolutionErrorPolicy,
    pub retain_failed_resolutions: bool,
}

#[derive(Serialize)]
pub struct CacheCleared {
    pub cleared: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let options = state.pipeline.options();
    let cache = state.pipeline.cache();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        cached_distributions: cache.len(),
        deadline_ms: u64::try_from(options.deadline.as_millis()).unwrap_or(u64::MAX),
        on_resolution_error: options.on_resolution_error,
        retain_failed_resolutions: cache.policy().retain_failures,
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<Vec<CacheEntrySummary>> {
    Json(state.pipeline.cache().snapshot())
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheCleared> {
    let cache = state.pipeline.cache();
    let cleared = cache.len();
    cache.clear();
    Json(CacheCleared { cleared })
}
