//! Validation pipeline coverage that doesn't require a live fetch target:
//! method, API key, body size, JSON decoding, URL shape, timeout bounds,
//! wait-event tokens, and SSRF/DNS rejection.

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
async fn invalid_url_scheme_rejected() {
    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "ftp://example.com"}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_URL");
}

#[tokio::test]
async fn timeout_over_sixty_seconds_rejected() {
    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "https://example.com", "timeout": 61}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_TIMEOUT");
}

#[tokio::test]
async fn unknown_wait_event_rejected() {
    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "https://example.com", "wait_event": "whenever"}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_WAIT_EVENT");
}

#[tokio::test]
async fn loopback_host_is_ssrf_blocked() {
    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "http://127.0.0.1:9/"}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "SSRF_BLOCKED");
}

#[tokio::test]
async fn body_over_one_mebibyte_rejected() {
    let app = test_app(ApiConfig::default()).await;
    let oversized_agent = "a".repeat(1024 * 1024 + 1);
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "https://example.com", "user_agent": oversized_agent}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn api_key_required_when_missing() {
    let app = test_app(ApiConfig { enabled: true, keys: vec!["secret".to_string()] }).await;
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "https://example.com"}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "API_KEY_REQUIRED");
}

#[tokio::test]
async fn api_key_invalid_when_wrong() {
    let app = test_app(ApiConfig { enabled: true, keys: vec!["secret".to_string()] }).await;
    let mut req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "https://example.com"}));
    req.headers_mut().insert("x-api-key", "wrong".parse().unwrap());
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "API_KEY_INVALID");
}

#[tokio::test]
async fn api_key_accepted_when_valid() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/").with_status(200).with_body("<html></html>").create_async().await;
    let app = test_app(ApiConfig { enabled: true, keys: vec!["secret".to_string()] }).await;
    let mut req = json_request("POST", "/api/ext/render", serde_json::json!({"url": server.url()}));
    req.headers_mut().insert("x-api-key", "secret".parse().unwrap());
    let (status, _body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::OK);
}
