//! Shared fixtures for integration tests.

#![allow(dead_code)]

use fallback_redirect::event::{EdgeEvent, InvocationContext};
use fallback_redirect::metadata::{MetadataResolver, ResolutionError, ResolutionResult};
use fallback_redirect::redirect::{CachePolicy, PipelineOptions, RedirectPipeline, ResolutionCache};
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const FUNCTION_ARN: &str = "arn:aws:lambda:eu-west-1:123456789012:function:lambda_name";

/// Resolver with a programmable answer that counts its invocations.
#[derive(Clone)]
pub struct ScriptedResolver {
    calls: Arc<AtomicUsize>,
    answer: Result<Option<String>, ResolutionError>,
    delay: Duration,
}

impl ScriptedResolver {
    pub fn returning(location: Option<&str>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            answer: Ok(location.map(str::to_string)),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(err: ResolutionError) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            answer: Err(err),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetadataResolver for ScriptedResolver {
    fn resolve(&self, _account_id: &str, _distribution_id: &str) -> BoxFuture<'static, ResolutionResult<Option<String>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer.clone();
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            answer
        }
        .boxed()
    }
}

pub fn pipeline(resolver: &ScriptedResolver, deadline: Duration) -> RedirectPipeline {
    let cache = ResolutionCache::new(Arc::new(resolver.clone()), CachePolicy::default());
    RedirectPipeline::new(
        cache,
        PipelineOptions {
            deadline,
            ..PipelineOptions::default()
        },
    )
}

pub fn context() -> InvocationContext {
    InvocationContext::new(FUNCTION_ARN)
}

/// Parameters for [`response_event_json`].
pub struct EventParams {
    pub method: &'static str,
    pub host: &'static str,
    pub uri: &'static str,
    pub query: &'static str,
    pub status: u16,
}

impl Default for EventParams {
    fn default() -> Self {
        Self {
            method: "GET",
            host: "www.example.org",
            uri: "/picture.jpg",
            query: "size=large",
            status: 200,
        }
    }
}

/// An origin-response event as delivered by the edge.
pub fn response_event_json(params: EventParams) -> serde_json::Value {
    json!({
        "Records": [{
            "cf": {
                "config": {
                    "distributionDomainName": "d123.cloudfront.net",
                    "distributionId": "EDFDVBD6EXAMPLE",
                    "eventType": "origin-response",
                    "requestId": "xGN7KWpVEmB9Dp7ctcVFQC4E-nrcOcEKS3QyAez--06dV7TEXAMPLE=="
                },
                "request": {
                    "clientIp": "2001:0db8:85a3:0:0:8a2e:0370:7334",
                    "method": params.method,
                    "uri": params.uri,
                    "querystring": params.query,
                    "headers": {
                        "host": [{"key": "Host", "value": params.host}],
                        "user-agent": [{"key": "User-Agent", "value": "curl/7.18.1"}]
                    }
                },
                "response": {
                    "status": params.status.to_string(),
                    "statusDescription": "OK",
                    "headers": {
                        "server": [{"key": "Server", "value": "MyCustomOrigin"}],
                        "set-cookie": [
                            {"key": "Set-Cookie", "value": "theme=light"},
                            {"key": "Set-Cookie", "value": "sessionToken=abc123; Expires=Wed, 09 Jun 2021 10:18:14 GMT"}
                        ]
                    }
                }
            }
        }]
    })
}

pub fn response_event(params: EventParams) -> EdgeEvent {
    serde_json::from_value(response_event_json(params)).unwrap()
}
