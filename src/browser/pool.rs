//! A bounded set of [`BrowserInstance`]s, warmed up at startup with
//! scaler/keepalive background tasks. Acquisition is non-blocking and
//! fail-fast rather than a blocking retry loop, so pool pressure is
//! observable as an HTTP-level error instead of added latency.

use crate::browser::instance::{BrowserInstance, InstanceState};
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("no browser instance available")]
    NoInstanceAvailable,
    #[error("pool is shutting down")]
    PoolShuttingDown,
}

pub struct PoolConfig {
    pub size: usize,
    pub headless: bool,
    pub restart_threshold: Option<u64>,
    pub restart_after_time: Option<Duration>,
    pub warmup_url: Option<String>,
}

/// A leased instance. Holding this keeps the instance's render lock held;
/// dropping it without calling [`PooledInstance::release`] releases the
/// lock without crediting a completed render, matching the renderer
/// aborting mid-navigation.
pub struct PooledInstance {
    instance: Arc<BrowserInstance>,
    guard: OwnedMutexGuard<InstanceState>,
}

impl PooledInstance {
    pub fn page(&self) -> &chromiumoxide::Page {
        self.guard.page()
    }

    pub fn id(&self) -> &str {
        self.instance.id()
    }

    pub fn started_at(&self) -> std::time::Instant {
        self.guard.started_at()
    }

    /// Credit a completed render (including a render that ended in a
    /// timeout) and release the instance back to the pool.
    pub fn release_completed(self) {
        self.instance.record_render_complete();
    }
}

pub struct InstancePool {
    instances: Vec<Arc<BrowserInstance>>,
    headless: bool,
    restart_threshold: Option<u64>,
    shutting_down: AtomicBool,
}

impl InstancePool {
    /// Launch `config.size` instances up front, optionally navigating each
    /// to `warmup_url` so the first real request doesn't pay cold-start cost.
    pub async fn start(config: PoolConfig) -> Result<Arc<Self>> {
        let mut instances = Vec::with_capacity(config.size);
        for i in 0..config.size {
            let id = format!("pool-{i}-{}", Uuid::new_v4());
            let instance = BrowserInstance::start(
                id,
                config.headless,
                config.restart_threshold,
                config.restart_after_time,
            )
            .await?;
            if let Some(url) = &config.warmup_url
                && let Some(mut guard) = instance.try_acquire()
            {
                if let Err(e) = guard.page().goto(url.as_str()).await {
                    warn!(error = %e, url, "pool warmup navigation failed");
                }
            }
            instances.push(Arc::new(instance));
        }
        info!(size = instances.len(), "instance pool started");
        Ok(Arc::new(Self {
            instances,
            headless: config.headless,
            restart_threshold: config.restart_threshold,
            shutting_down: AtomicBool::new(false),
        }))
    }

    pub fn size(&self) -> usize {
        self.instances.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.instances.iter().filter(|i| i.try_acquire().is_none()).count()
    }

    /// Non-blocking: scans for an idle instance not currently restarting,
    /// restarts it in place if it has crossed the render-count threshold,
    /// and returns it locked. Returns `ErrPoolShuttingDown` once
    /// [`InstancePool::shutdown`] has been called, else `ErrNoInstanceAvailable`
    /// if every instance is currently in use.
    pub async fn acquire(&self) -> Result<PooledInstance, AcquireError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(AcquireError::PoolShuttingDown);
        }

        for instance in &self.instances {
            if instance.restart_in_flight() {
                continue;
            }
            let Some(mut guard) = instance.try_acquire() else {
                continue;
            };
            if instance.needs_restart(&guard)
                && let Err(e) = instance.restart(&mut guard).await
            {
                warn!(instance_id = instance.id(), error = %e, "instance restart failed, skipping");
                continue;
            }
            return Ok(PooledInstance { instance: instance.clone(), guard });
        }

        Err(AcquireError::NoInstanceAvailable)
    }

    pub fn restart_threshold(&self) -> Option<u64> {
        self.restart_threshold
    }

    pub fn headless(&self) -> bool {
        self.headless
    }

    /// Stop handing out new instances, then wait up to `timeout` for
    /// in-flight renders to finish before force-closing every instance.
    pub async fn shutdown(self: Arc<Self>, timeout: Duration) {
        self.shutting_down.store(true, Ordering::Release);
        info!("pool shutdown requested, draining in-use instances");

        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline && self.in_use_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let remaining = self.in_use_count();
        if remaining > 0 {
            warn!(remaining, "shutting down pool with renders still in flight");
        }

        let pool = match Arc::try_unwrap(self) {
            Ok(pool) => pool,
            Err(arc) => {
                warn!("pool still referenced elsewhere at shutdown; closing instances in place");
                for instance in arc.instances.iter().cloned() {
                    if let Ok(instance) = Arc::try_unwrap(instance) {
                        instance.close().await;
                    }
                }
                return;
            }
        };
        for instance in pool.instances {
            if let Ok(instance) = Arc::try_unwrap(instance) {
                instance.close().await;
            }
        }
    }
}
