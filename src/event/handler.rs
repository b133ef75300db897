//! Entry point for a single edge invocation.

use std::time::Instant;
use tracing::Instrument;

use crate::event::types::{EdgeEvent, EdgeRequest, HandlerError, InvocationContext};
use crate::observability::metrics;
use crate::redirect::{Decision, DistributionIdentity, RedirectPipeline, RequestContext, ResponseEnvelope};

/// Run the redirect pipeline for one edge event and return the response the
/// edge should send on.
///
/// Only an event without a record is rejected. A record whose request or
/// invocation identity is unusable hands its response back untouched.
pub async fn handle_event(
    pipeline: &RedirectPipeline,
    event: EdgeEvent,
    context: &InvocationContext,
) -> Result<ResponseEnvelope, HandlerError> {
    let record = event
        .records
        .into_iter()
        .next()
        .ok_or_else(|| HandlerError::InvalidEvent("event has no records".to_string()))?;
    let payload = record.cf;
    let config = payload.config;

    let span = tracing::info_span!(
        "invocation",
        distribution_id = %config.distribution_id,
        request_id = config.request_id.as_deref().unwrap_or("-"),
    );

    async move {
        tracing::info!(event_type = %config.event_type, "Handling event");
        let started = Instant::now();

        let (request, identity) =
            match request_parts(&payload.request, context, &config.distribution_id) {
                Ok(parts) => parts,
                Err(e) => {
                    tracing::warn!(
                        status = %payload.response.status,
                        error = %e,
                        "Cannot identify request, passing response through unmodified"
                    );
                    metrics::record_decision(Decision::PassthroughInvalid.as_str(), started);
                    return Ok(payload.response);
                }
            };
        tracing::info!(
            "{} request for //{}{}?{}",
            request.method,
            request.host,
            request.path,
            request.query_string
        );

        let response = pipeline
            .handle_response(&request, &identity, payload.response)
            .await?;
        Ok::<_, HandlerError>(response)
    }
    .instrument(span)
    .await
}

fn request_parts(
    request: &EdgeRequest,
    context: &InvocationContext,
    distribution_id: &str,
) -> Result<(RequestContext, DistributionIdentity), HandlerError> {
    let request = request.to_context()?;
    let identity = DistributionIdentity::new(context.account_id()?, distribution_id);
    Ok((request, identity))
}
