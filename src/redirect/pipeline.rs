//! The redirect decision: 404 in, 302 out when a fallback location exists.
//!
//! ```text
//! check status ──(not 404)──────────────────────────────▶ unchanged
//!      │
//!   (404)
//!      ▼
//! cache lookup ⟷ deadline ──(deadline first)─────────────▶ unchanged
//!      │              └─────(no location)────────────────▶ unchanged
//!      │              └─────(lookup error)───────────────▶ error, or unchanged
//!      ▼
//! render template → mutate to 302 Found ─────────────────▶ redirect
//! ```
//!
//! When the deadline wins, the lookup is abandoned, not cancelled: it keeps
//! running in the background and its result still lands in the cache.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;

use crate::metadata::ResolutionError;
use crate::observability::metrics;
use crate::redirect::cache::ResolutionCache;
use crate::redirect::template::{render, request_bindings};
use crate::redirect::types::{DistributionIdentity, RequestContext, ResponseEnvelope};

/// How a failed metadata lookup affects the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionErrorPolicy {
    /// Fail the invocation so the error is visible to operators.
    #[default]
    Propagate,
    /// Log the error and return the original response.
    PassThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Upper bound on time spent waiting for the fallback location.
    pub deadline: Duration,
    pub on_resolution_error: ResolutionErrorPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            deadline: Duration::from_millis(25_000),
            on_resolution_error: ResolutionErrorPolicy::default(),
        }
    }
}

/// Why a response left the pipeline the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    PassthroughStatus,
    PassthroughAbsent,
    PassthroughTimeout,
    PassthroughError,
    PassthroughInvalid,
    Redirected,
    Failed,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::PassthroughStatus => "passthrough_status",
            Decision::PassthroughAbsent => "passthrough_absent",
            Decision::PassthroughTimeout => "passthrough_timeout",
            Decision::PassthroughError => "passthrough_error",
            Decision::PassthroughInvalid => "passthrough_invalid",
            Decision::Redirected => "redirected",
            Decision::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Turns origin 404s into redirects to the distribution's fallback location.
#[derive(Debug, Clone)]
pub struct RedirectPipeline {
    cache: ResolutionCache,
    options: PipelineOptions,
}

impl RedirectPipeline {
    pub fn new(cache: ResolutionCache, options: PipelineOptions) -> Self {
        Self { cache, options }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Decide what to send back for `response`.
    ///
    /// Only a 404 with a resolvable fallback location is modified; every other
    /// path hands back `response` untouched.
    pub async fn handle_response(
        &self,
        request: &RequestContext,
        identity: &DistributionIdentity,
        response: ResponseEnvelope,
    ) -> Result<ResponseEnvelope, PipelineError> {
        let started = Instant::now();
        let (decision, result) = self.decide(request, identity, response).await;
        metrics::record_decision(decision.as_str(), started);
        result
    }

    async fn decide(
        &self,
        request: &RequestContext,
        identity: &DistributionIdentity,
        mut response: ResponseEnvelope,
    ) -> (Decision, Result<ResponseEnvelope, PipelineError>) {
        if !response.is_not_found() {
            tracing::info!(status = %response.status, "Passing response through unmodified");
            return (Decision::PassthroughStatus, Ok(response));
        }

        tracing::info!(
            distribution_id = %identity.distribution_id,
            "Response is a 404, processing"
        );

        let lookup = self
            .cache
            .get_or_resolve(&identity.account_id, &identity.distribution_id);

        let template = match timeout(self.options.deadline, lookup).await {
            Ok(Ok(Some(template))) => template,
            Ok(Ok(None)) => {
                tracing::info!("No location specified, passing through unmodified");
                return (Decision::PassthroughAbsent, Ok(response));
            }
            Ok(Err(e)) => {
                return match self.options.on_resolution_error {
                    ResolutionErrorPolicy::Propagate => {
                        tracing::error!(
                            distribution_id = %identity.distribution_id,
                            error = %e,
                            "Fallback location lookup failed"
                        );
                        (Decision::Failed, Err(e.into()))
                    }
                    ResolutionErrorPolicy::PassThrough => {
                        tracing::warn!(
                            distribution_id = %identity.distribution_id,
                            error = %e,
                            "Fallback location lookup failed, passing through the 404"
                        );
                        (Decision::PassthroughError, Ok(response))
                    }
                };
            }
            Err(_) => {
                tracing::warn!(
                    deadline = ?self.options.deadline,
                    "Timeout generating redirect, passing through the 404 anyway"
                );
                return (Decision::PassthroughTimeout, Ok(response));
            }
        };

        tracing::info!(template = %template, "Found redirect location");
        let location = render(&template, &request_bindings(request));
        tracing::info!(location = %location, "Rendering 302 redirect");

        response.redirect_to(location);
        (Decision::Redirected, Ok(response))
    }
}
