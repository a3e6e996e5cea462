use jsbug_render::browser::{InstancePool, PoolConfig};
use jsbug_render::config::ApiConfig;
use jsbug_render::events::ProgressBus;
use jsbug_render::fetcher::HttpFetcher;
use jsbug_render::http::{router, AppState};
use jsbug_render::screenshot_store::ScreenshotStore;
use jsbug_render::Orchestrator;
use std::sync::Arc;
use std::time::Duration;

/// Build a router backed by a zero-capacity instance pool, so tests never
/// need a real Chrome binary. Any `js_enabled: true` request will fail
/// fast with `POOL_EXHAUSTED` since the pool never holds an instance.
pub async fn test_app(api: ApiConfig) -> axum::Router {
    let pool = InstancePool::start(PoolConfig {
        size: 0,
        headless: true,
        restart_threshold: None,
        restart_after_time: None,
        warmup_url: None,
    })
    .await
    .expect("zero-size pool always starts");
    let fetcher = HttpFetcher::new().expect("client builder never fails with this config");
    let progress = ProgressBus::new();
    let screenshots = ScreenshotStore::new(Duration::from_secs(300));
    let orchestrator = Orchestrator::new(pool, fetcher, progress.clone(), screenshots);
    let state = Arc::new(AppState { orchestrator, progress, api });
    router(state, &["*".to_string()])
}

pub fn json_request(method: &str, path: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}
