//! A single long-lived browser process paired with one reusable page,
//! with RAII teardown. State is
//! `{processHandle, pageContext, startedAt, renders, lock, restartInFlight}`,
//! with a lock that permits exactly one render at a time. The mutable
//! browser/page/profile fields live behind that same lock, so acquiring the
//! render lock and reading the live page are the same operation — there is
//! no separate "state" mutex to get out of sync with the exclusivity one.

use crate::browser::launch;
use crate::browser::profile::BrowserProfile;
use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct InstanceState {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
    profile: BrowserProfile,
    started_at: Instant,
}

impl InstanceState {
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

pub struct BrowserInstance {
    id: String,
    state: Arc<Mutex<InstanceState>>,
    renders: AtomicU64,
    restart_threshold: Option<u64>,
    restart_after_time: Option<std::time::Duration>,
    restart_in_flight: AtomicBool,
    headless: bool,
}

impl BrowserInstance {
    /// Launch a fresh browser process with its own UUID-named profile
    /// directory and one blank page, ready to be registered with the pool.
    pub async fn start(
        id: String,
        headless: bool,
        restart_threshold: Option<u64>,
        restart_after_time: Option<std::time::Duration>,
    ) -> Result<Self> {
        let state = launch_fresh_state(headless).await?;
        info!(instance_id = %id, "browser instance started");
        Ok(Self {
            id,
            state: Arc::new(Mutex::new(state)),
            renders: AtomicU64::new(0),
            restart_threshold,
            restart_after_time,
            restart_in_flight: AtomicBool::new(false),
            headless,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::Acquire)
    }

    /// Try to acquire the single-render lock without waiting, returning an
    /// owned guard granting access to the live page. Returns `None` if a
    /// render (or a restart) already owns the instance — the pool treats
    /// that as in-use and skips it rather than queueing behind it.
    pub fn try_acquire(&self) -> Option<OwnedMutexGuard<InstanceState>> {
        self.state.clone().try_lock_owned().ok()
    }

    /// Increment the completed-render counter. Called by the renderer on
    /// every terminal outcome, including timeouts — a timed-out render still
    /// consumed one pooled instance slot for its duration.
    pub fn record_render_complete(&self) {
        self.renders.fetch_add(1, Ordering::AcqRel);
    }

    /// Whether this instance has crossed its render-count threshold or its
    /// time-in-service threshold (`renders >= restartAfterCount ||
    /// now - startedAt >= restartAfterTime`) and should be recycled before
    /// its next acquisition. Takes the already-held guard so the
    /// elapsed-time check reads the live `started_at` without a second lock.
    pub fn needs_restart(&self, state: &InstanceState) -> bool {
        if let Some(threshold) = self.restart_threshold
            && self.render_count() >= threshold
        {
            return true;
        }
        if let Some(max_age) = self.restart_after_time
            && state.started_at().elapsed() >= max_age
        {
            return true;
        }
        false
    }

    pub fn restart_in_flight(&self) -> bool {
        self.restart_in_flight.load(Ordering::Acquire)
    }

    /// Close the current page and browser process, relaunch fresh, and
    /// reset the render counter. Caller must already hold the acquisition
    /// guard (i.e. have called `try_acquire` successfully) so no render can
    /// observe a half-torn-down instance.
    pub async fn restart(&self, guard: &mut InstanceState) -> Result<()> {
        self.restart_in_flight.store(true, Ordering::Release);
        let result = self.restart_state(guard).await;
        self.restart_in_flight.store(false, Ordering::Release);
        result?;
        self.renders.store(0, Ordering::Release);
        Ok(())
    }

    async fn restart_state(&self, guard: &mut InstanceState) -> Result<()> {
        warn!(instance_id = %self.id, renders = self.render_count(), "restarting instance past threshold");
        guard.handler_task.abort();
        let _ = guard.browser.close().await;
        *guard = launch_fresh_state(self.headless).await?;
        Ok(())
    }

    /// Terminal teardown: abort the CDP handler and close the browser
    /// process. The profile directory's own `Drop` impl removes it from disk.
    pub async fn close(self) {
        let mut guard = self.state.lock().await;
        guard.handler_task.abort();
        if let Err(e) = guard.browser.close().await {
            warn!(instance_id = %self.id, error = %e, "error closing browser instance");
        }
    }
}

async fn launch_fresh_state(headless: bool) -> Result<InstanceState> {
    let profile = crate::browser::profile::create_unique_profile_with_prefix("jsbug_pool")
        .context("failed to create browser profile directory")?;
    let (mut browser, handler_task, _user_data_dir) =
        launch::launch_browser(headless, Some(profile.path().to_path_buf())).await?;
    let page = browser.new_page("about:blank").await.context("failed to open browser page")?;
    Ok(InstanceState { browser, handler_task, page, profile, started_at: Instant::now() })
}

impl std::fmt::Debug for BrowserInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserInstance")
            .field("id", &self.id)
            .field("renders", &self.render_count())
            .field("restart_in_flight", &self.restart_in_flight())
            .finish_non_exhaustive()
    }
}
