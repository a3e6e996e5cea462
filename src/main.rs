//! Process entry point: load config, start the instance pool, bind axum,
//! serve until SIGINT/SIGTERM, then drain the pool and progress sweeper
//! before exiting.

use anyhow::{Context, Result};
use jsbug_render::browser::{InstancePool, PoolConfig as BrowserPoolConfig};
use jsbug_render::events::ProgressBus;
use jsbug_render::fetcher::HttpFetcher;
use jsbug_render::http::{router, AppState};
use jsbug_render::screenshot_store::{spawn_sweeper, ScreenshotStore};
use jsbug_render::{AppConfig, Orchestrator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const POOL_SHUTDOWN_BOUND: Duration = Duration::from_secs(30);
const SCREENSHOT_TTL: Duration = Duration::from_secs(300);
const SCREENSHOT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config_path = std::env::var("JSBUG_CONFIG_PATH").ok().map(std::path::PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("failed to load configuration")?;

    let pool = InstancePool::start(BrowserPoolConfig {
        size: config.pool.size,
        headless: config.pool.headless,
        restart_threshold: config.pool.restart_after_count(),
        restart_after_time: config.pool.restart_after_time(),
        warmup_url: (config.pool.warmup_url != "about:blank").then(|| config.pool.warmup_url.clone()),
    })
    .await
    .context("failed to start browser instance pool")?;

    let fetcher = HttpFetcher::new().context("failed to build HTTP fetcher")?;
    let progress = ProgressBus::new();
    let screenshot_store = ScreenshotStore::new(SCREENSHOT_TTL);
    let orchestrator = Orchestrator::new(pool.clone(), fetcher, progress.clone(), screenshot_store.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(screenshot_store.clone(), SCREENSHOT_SWEEP_INTERVAL, shutdown_rx);

    let state = Arc::new(AppState { orchestrator, progress, api: config.api.clone() });
    let app = router(state, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr, "jsbug-render listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown signal received, draining pool");
    pool.shutdown(POOL_SHUTDOWN_BOUND).await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        error!(error = %e, "screenshot sweeper task panicked during shutdown");
    }
    drop(screenshot_store);

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
