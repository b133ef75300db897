//! Wire types of the edge trigger event.
//!
//! ```json
//! {"Records": [{"cf": {
//!     "config":   {"distributionId": "...", "eventType": "origin-response", "requestId": "..."},
//!     "request":  {"method": "GET", "uri": "/picture.jpg", "querystring": "size=large",
//!                  "headers": {"host": [{"key": "Host", "value": "www.example.org"}]}},
//!     "response": {"status": "404", "statusDescription": "Not Found", "headers": {}}
//! }}]}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metadata::ResolutionError;
use crate::redirect::{Headers, PipelineError, RequestContext, ResponseEnvelope};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEvent {
    #[serde(rename = "Records")]
    pub records: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub cf: EdgePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgePayload {
    pub config: TriggerConfig,
    pub request: EdgeRequest,
    pub response: ResponseEnvelope,
}

/// Which distribution fired, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    pub distribution_id: String,
    pub event_type: String,
    /// Not present on every event type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_domain_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRequest {
    pub method: String,
    pub uri: String,
    #[serde(rename = "querystring", default)]
    pub query_string: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
}

impl EdgeRequest {
    /// Template-facing view of the request. The `Host` header is mandatory.
    pub fn to_context(&self) -> Result<RequestContext, HandlerError> {
        let host = self
            .headers
            .get("host")
            .and_then(|entries| entries.first())
            .map(|entry| entry.value.clone())
            .ok_or_else(|| HandlerError::InvalidEvent("request has no host header".to_string()))?;

        Ok(RequestContext {
            method: self.method.clone(),
            path: self.uri.clone(),
            query_string: self.query_string.clone(),
            host,
        })
    }
}

/// Invocation metadata supplied by the platform alongside the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub invoked_function_arn: String,
}

impl InvocationContext {
    pub fn new(invoked_function_arn: impl Into<String>) -> Self {
        Self {
            invoked_function_arn: invoked_function_arn.into(),
        }
    }

    /// Account owning the function, the fifth field of its ARN.
    ///
    /// Functions cannot be attached to another account's distribution, so
    /// this is also the distribution's account.
    pub fn account_id(&self) -> Result<&str, HandlerError> {
        account_id_from_arn(&self.invoked_function_arn)
    }
}

/// `arn:aws:lambda:eu-west-1:123456789012:function:name` → `123456789012`.
pub fn account_id_from_arn(arn: &str) -> Result<&str, HandlerError> {
    match arn.split(':').nth(4) {
        Some(account) if arn.starts_with("arn:") && !account.is_empty() => Ok(account),
        _ => Err(HandlerError::InvalidEvent(format!(
            "cannot derive account id from function ARN '{arn}'"
        ))),
    }
}

/// Errors surfaced to the invoking platform.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl From<PipelineError> for HandlerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Resolution(e) => HandlerError::Resolution(e),
        }
    }
}
