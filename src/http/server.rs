//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the invocation, health and admin handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Decode edge events, run them through the pipeline, encode the response
//! - Map handler errors to HTTP status codes

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::admin::setup_admin_router;
use crate::config::ServiceConfig;
use crate::event::{handle_event, EdgeEvent, HandlerError, InvocationContext};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::Shutdown;
use crate::redirect::RedirectPipeline;

/// Header carrying the ARN of the invoked function.
pub const FUNCTION_ARN_HEADER: &str = "x-invoked-function-arn";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RedirectPipeline,
    pub config: Arc<ServiceConfig>,
}

/// JSON error body returned for failed invocations.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

fn error_response(status: StatusCode, error: &'static str, message: String) -> Response {
    (status, Json(ErrorBody { error, message })).into_response()
}

/// HTTP front for the invocation boundary.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, pipeline: RedirectPipeline) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            pipeline,
            config: config.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/invoke", post(invoke_handler))
            .route("/health", get(health_handler))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
                .layer(DefaultBodyLimit::max(config.server.max_body_bytes)),
        )
    }

    /// The fully layered router, for serving or for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(Shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Run one edge event through the pipeline.
async fn invoke_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let span = tracing::info_span!("invoke", request_id = %request_id(&headers));

    async move {
        let event: EdgeEvent = match serde_json::from_slice(&body) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting undecodable event");
                return error_response(StatusCode::BAD_REQUEST, "invalid_event", e.to_string());
            }
        };

        // Without an ARN the account is unknown and the response passes through.
        let function_arn = headers
            .get(FUNCTION_ARN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| state.config.invocation.function_arn.clone())
            .unwrap_or_default();
        let context = InvocationContext::new(function_arn);

        match handle_event(&state.pipeline, event, &context).await {
            Ok(response) => (StatusCode::OK, Json(response)).into_response(),
            Err(HandlerError::InvalidEvent(message)) => {
                tracing::warn!(message = %message, "Rejecting invalid event");
                error_response(StatusCode::BAD_REQUEST, "invalid_event", message)
            }
            Err(HandlerError::Resolution(e)) => {
                error_response(StatusCode::BAD_GATEWAY, "resolution_failed", e.to_string())
            }
        }
    }
    .instrument(span)
    .await
}
