//! End-to-end coverage of the non-JS render path through the full axum
//! stack: HTTP transport → orchestrator → fetcher → parser → response
//! assembly, as a plain HTML GET against an SEO-auditable page would see it.

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
async fn minimal_render_returns_always_present_fields() {
    let mut server = mockito::Server::new_async().await;
    let html = r#"<html><head><title>Example</title>
        <meta name="description" content="An example page.">
        <link rel="canonical" href="https://example.com/canonical">
        </head><body><h1>Hello</h1><p>Some body copy.</p></body></html>"#;
    let _mock = server.mock("GET", "/").with_status(200).with_header("content-type", "text/html").with_body(html).create_async().await;

    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": server.url()}));
    let (status, body) = send(app, req).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status_code"], 200);
    assert_eq!(body["data"]["title"], "Example");
    assert_eq!(body["data"]["meta_description"], "An example page.");
    assert_eq!(body["data"]["canonical_url"], "https://example.com/canonical");
    assert_eq!(body["data"]["h1"][0], "Hello");
    // opt-in fields were never requested, so they're absent, not null
    assert!(body["data"].get("body_text").is_none());
    assert!(body["data"].get("html").is_none());
}

#[tokio::test]
async fn include_flags_populate_opt_in_fields_even_when_empty() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/").with_status(200).with_body("<html><head><title>T</title></head><body></body></html>").create_async().await;

    let app = test_app(ApiConfig::default()).await;
    let req = json_request(
        "POST",
        "/api/ext/render",
        serde_json::json!({"url": server.url(), "include_links": true, "include_images": true, "include_text": true}),
    );
    let (status, body) = send(app, req).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert!(body["data"]["links"].as_array().unwrap().is_empty());
    assert!(body["data"]["images"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["body_text"], "");
}

#[tokio::test]
async fn max_content_length_recomputes_word_count() {
    let mut server = mockito::Server::new_async().await;
    let html = "<html><head><title>T</title></head><body><p>one two three four five</p></body></html>";
    let _mock = server.mock("GET", "/").with_status(200).with_body(html).create_async().await;

    let app = test_app(ApiConfig::default()).await;
    let uncapped_req = json_request("POST", "/api/ext/render", serde_json::json!({"url": server.url()}));
    let (_, uncapped) = send(app.clone(), uncapped_req).await;
    assert_eq!(uncapped["data"]["word_count"], 5);

    let capped_req = json_request("POST", "/api/ext/render", serde_json::json!({"url": server.url(), "max_content_length": 10}));
    let (_, capped) = send(app, capped_req).await;
    let capped_count = capped["data"]["word_count"].as_u64().unwrap();
    assert!(capped_count < 5, "expected truncated word_count < 5, got {capped_count}");
}

#[tokio::test]
async fn get_method_is_rejected() {
    let app = test_app(ApiConfig::default()).await;
    let req = axum::http::Request::builder().method("GET").uri("/api/ext/render").body(axum::body::Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = test_app(ApiConfig::default()).await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/ext/render")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let app = test_app(ApiConfig::default()).await;
    let req = json_request("POST", "/api/ext/render", serde_json::json!({"url": "https://example.com", "bogus_field": 1}));
    let (status, body) = send(app, req).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");
}
