//! `GET /api/ext/progress/{request_id}`: the SSE stream delivers the events
//! published for a matching `request_id` and closes itself once a terminal
//! event (`complete`/`error`) is published.

mod common;

use common::{json_request, test_app};
use jsbug_render::config::ApiConfig;
use tower::ServiceExt;

#[tokio::test]
async fn stream_closes_after_terminal_event() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/").with_status(200).with_body("<html></html>").create_async().await;

    let app = test_app(ApiConfig::default()).await;

    let progress_req = axum::http::Request::builder()
        .method("GET")
        .uri("/api/ext/progress/req-xyz")
        .body(axum::body::Body::empty())
        .unwrap();
    let progress_app = app.clone();
    let progress_task = tokio::spawn(async move {
        let response = progress_app.oneshot(progress_req).await.unwrap();
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
    });

    // Give the SSE handler a moment to subscribe before the render request
    // publishes its events.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let render_req = json_request(
        "POST",
        "/api/ext/render",
        serde_json::json!({"url": server.url(), "request_id": "req-xyz"}),
    );
    let (status, _body) = {
        let response = app.oneshot(render_req).await.unwrap();
        (response.status(), axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap())
    };
    assert_eq!(status, axum::http::StatusCode::OK);

    let bytes = tokio::time::timeout(std::time::Duration::from_secs(5), progress_task)
        .await
        .expect("progress stream should close once the terminal event is published")
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: started"));
    assert!(text.contains("event: complete"));
}
