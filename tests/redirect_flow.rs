//! End-to-end invocations through the event handler.

use std::time::Duration;

use fallback_redirect::event::{handle_event, HandlerError, InvocationContext};
use fallback_redirect::metadata::ResolutionError;

mod common;
use common::{context, pipeline, response_event, EventParams, ScriptedResolver};

const DEADLINE: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_passes_non_404_through_unmodified() {
    let resolver = ScriptedResolver::returning(Some("https://target.example.org/"));
    let pipeline = pipeline(&resolver, DEADLINE);

    for status in [200, 201, 302] {
        let event = response_event(EventParams { status, ..Default::default() });
        let original = event.records[0].cf.response.clone();

        let response = handle_event(&pipeline, event, &context()).await.unwrap();
        assert_eq!(response, original);
        assert_eq!(response.status, status.to_string());
    }
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_rewrites_404() {
    let resolver = ScriptedResolver::returning(Some("https://target.example.org/"));
    let pipeline = pipeline(&resolver, DEADLINE);

    let event = response_event(EventParams { status: 404, ..Default::default() });
    let response = handle_event(&pipeline, event, &context()).await.unwrap();

    assert_eq!(response.status, "302");
    assert_eq!(response.status_description.as_deref(), Some("Found"));
    assert_eq!(response.body.as_deref(), Some(""));

    let location = &response.headers["location"];
    assert_eq!(location.len(), 1);
    assert_eq!(location[0].value, "https://target.example.org/");

    // Origin headers are kept.
    assert_eq!(response.headers["set-cookie"].len(), 2);
}

#[tokio::test]
async fn test_no_location_keeps_404() {
    let resolver = ScriptedResolver::returning(None);
    let pipeline = pipeline(&resolver, DEADLINE);

    let event = response_event(EventParams { status: 404, ..Default::default() });
    let original = event.records[0].cf.response.clone();

    let response = handle_event(&pipeline, event, &context()).await.unwrap();
    assert_eq!(response.status, "404");
    assert_eq!(response, original);
}

#[tokio::test]
async fn test_substitutes_vars_in_location() {
    let resolver = ScriptedResolver::returning(Some("https://target2.example.org/@host@@path@"));
    let pipeline = pipeline(&resolver, DEADLINE);

    let event = response_event(EventParams {
        host: "www.example.org",
        uri: "/foo/bar",
        query: "key=value&otherkey=othervalue",
        status: 404,
        ..Default::default()
    });
    let response = handle_event(&pipeline, event, &context()).await.unwrap();

    assert_eq!(
        response.headers["location"][0].value,
        "https://target2.example.org/www.example.org/foo/bar"
    );
}

#[tokio::test]
async fn test_query_and_escape_in_location() {
    let resolver = ScriptedResolver::returning(Some("https://@host@/search?@query@&by=ops@@example.org"));
    let pipeline = pipeline(&resolver, DEADLINE);

    let event = response_event(EventParams { status: 404, ..Default::default() });
    let response = handle_event(&pipeline, event, &context()).await.unwrap();

    assert_eq!(
        response.header("location"),
        Some("https://www.example.org/search?size=large&by=ops@example.org")
    );
}

#[tokio::test(start_paused = true)]
async fn test_times_out_rewriting_404() {
    let resolver = ScriptedResolver::returning(Some("https://target.example.org/"))
        .delayed(Duration::from_millis(1000));
    let pipeline = pipeline(&resolver, Duration::from_millis(100));

    let event = response_event(EventParams { status: 404, ..Default::default() });
    let response = handle_event(&pipeline, event, &context()).await.unwrap();
    assert_eq!(response.status, "404");

    // The lookup finished in the background; the next 404 redirects without a new call.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let event = response_event(EventParams { status: 404, ..Default::default() });
    let response = handle_event(&pipeline, event, &context()).await.unwrap();
    assert_eq!(response.status, "302");
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_invocations_share_one_lookup() {
    let resolver = ScriptedResolver::returning(Some("/fallback")).delayed(Duration::from_millis(50));
    let pipeline = pipeline(&resolver, DEADLINE);

    let invocations = (0..8).map(|_| {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            let event = response_event(EventParams { status: 404, ..Default::default() });
            handle_event(&pipeline, event, &context()).await
        })
    });

    for handle in invocations.collect::<Vec<_>>() {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.header("location"), Some("/fallback"));
    }
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_resolution_failure_fails_invocation() {
    let resolver = ScriptedResolver::failing(ResolutionError::Transport("connection refused".to_string()));
    let pipeline = pipeline(&resolver, DEADLINE);

    let event = response_event(EventParams { status: 404, ..Default::default() });
    let err = handle_event(&pipeline, event, &context()).await.unwrap_err();
    assert!(matches!(err, HandlerError::Resolution(ResolutionError::Transport(_))));

    // Non-404s are unaffected by a broken resolver.
    let event = response_event(EventParams { status: 200, ..Default::default() });
    assert!(handle_event(&pipeline, event, &context()).await.is_ok());
}

#[tokio::test]
async fn test_unusable_function_arn_fails_open() {
    let resolver = ScriptedResolver::returning(Some("https://target.example.org/"));
    let pipeline = pipeline(&resolver, DEADLINE);
    let context = InvocationContext::new("lambda_name");

    for status in [200, 404] {
        let event = response_event(EventParams { status, ..Default::default() });
        let original = event.records[0].cf.response.clone();
        let response = handle_event(&pipeline, event, &context).await.unwrap();
        assert_eq!(response, original);
    }
    assert_eq!(resolver.calls(), 0);
}
