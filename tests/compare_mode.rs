//! Compare-mode coverage: both legs run even if one fails, the outer
//! response is always 200, and the failing leg reports via `FetchStatus`
//! rather than propagating as a top-level error. The pool under test has
//! zero capacity, so the JS leg always fails with `POOL_EXHAUSTED` without
//! needing a real browser.

mod common;

use common::{json_request, test_app};
use jsbug_render::config::ApiConfig;
use serde_json::Value;
use tower::ServiceExt;

async fn send(app: axum::Router, req: axum::http::Request<axum::body::Body>) -> (axum::http::StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn js_leg_failure_does_not_fail_the_whole_request() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_body("<html><head><title>T</title></head><body><h1>Hi</h1></body></html>")
        .create_async()
        .await;

    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/compare", serde_json::json!({"url": server.url()}));
    let (status, body) = send(app, req).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["js_status"]["success"], false);
    assert_eq!(body["data"]["js_status"]["error_code"], "POOL_EXHAUSTED");
    assert_eq!(body["data"]["http_status"]["success"], true);
    assert!(body["data"]["js"].is_null());
    assert!(body["data"]["diff"].is_null());
    assert!(body["data"]["rendering_impact"].is_null());
}

#[tokio::test]
async fn compare_validates_shared_params_before_dispatch() {
    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/compare", serde_json::json!({"url": "http://127.0.0.1:9/"}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "SSRF_BLOCKED");
}
