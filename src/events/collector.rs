//! Subscribes to one navigation's protocol stream and produces consolidated
//! telemetry. Each CDP event stream is drained by its own spawned task into
//! a shared `Mutex`-protected buffer, and `detach()` aborts every task the
//! way
//! `PooledBrowserWrapper::drop` aborts its handler.

pub use super::types::{ConsoleLevel, ConsoleMessage, JsError, Lifecycle, NetworkEntry, Telemetry};

use crate::blocklist::ResourceType;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, EventLoadEventFired};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Shared {
    telemetry: Telemetry,
}

pub struct EventCollector {
    shared: Arc<Mutex<Shared>>,
    detached: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
    nav_start: Instant,
}

impl EventCollector {
    /// Attach to `page` and start collecting. `nav_start` is the moment the
    /// navigation began; all offsets are relative to it.
    pub async fn attach(page: &Page, nav_start: Instant) -> anyhow::Result<Self> {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let detached = Arc::new(AtomicBool::new(false));
        let mut tasks = Vec::new();

        tasks.push(spawn_request_listener(page, shared.clone(), detached.clone(), nav_start).await?);
        tasks.push(spawn_response_listener(page, shared.clone(), detached.clone(), nav_start).await?);
        tasks.push(spawn_finished_listener(page, shared.clone(), detached.clone(), nav_start).await?);
        tasks.push(spawn_failed_listener(page, shared.clone(), detached.clone(), nav_start).await?);
        tasks.push(spawn_console_listener(page, shared.clone(), detached.clone(), nav_start).await?);
        tasks.push(spawn_exception_listener(page, shared.clone(), detached.clone(), nav_start).await?);
        tasks.push(spawn_dcl_listener(page, shared.clone(), detached.clone(), nav_start).await?);
        tasks.push(spawn_load_listener(page, shared.clone(), detached.clone(), nav_start).await?);

        Ok(Self { shared, detached, tasks, nav_start })
    }

    /// Current in-flight count, used by the renderer's networkIdle wait.
    pub async fn in_flight_count(&self) -> usize {
        self.shared.lock().await.telemetry.in_flight_count()
    }

    /// Snapshot of lifecycle milestones observed so far, used by the
    /// renderer's DOMContentLoaded/load wait.
    pub async fn lifecycle_snapshot(&self) -> Lifecycle {
        self.shared.lock().await.telemetry.lifecycle.clone()
    }

    /// Status code of the top-level document response matching `url`, if
    /// observed yet. The CDP `Document` resource type has no counterpart in
    /// our closed [`crate::blocklist::ResourceType`] set and falls into
    /// `Other`, which is exactly what the main navigation request is.
    pub async fn document_status(&self, url: &str) -> Option<u16> {
        self.shared.lock().await.telemetry.network.iter().find(|n| n.url == url).and_then(|n| n.status)
    }

    pub fn nav_start(&self) -> Instant {
        self.nav_start
    }

    /// Mark a request as blocked by the blocklist (recorded with `blocked=true`).
    pub async fn record_blocked(&self, request_id: String, url: String, method: String, resource_type: ResourceType) {
        if self.detached.load(Ordering::Acquire) {
            return;
        }
        let offset = self.nav_start.elapsed().as_millis() as u64;
        let mut guard = self.shared.lock().await;
        guard.telemetry.network.push(NetworkEntry {
            id: request_id,
            url,
            method,
            resource_type,
            status: None,
            bytes: 0,
            duration_ms: None,
            blocked: true,
            failed: false,
            start_offset_ms: offset,
        });
    }

    /// A cloneable handle that can record blocked requests from the Fetch
    /// interception task, which runs independently of (and is spawned
    /// alongside, not owned by) this collector.
    pub fn block_recorder(&self) -> BlockRecorder {
        BlockRecorder { shared: self.shared.clone(), detached: self.detached.clone(), nav_start: self.nav_start }
    }

    /// Detach cleanly: stop accepting new events and abort the listener tasks.
    pub fn detach(mut self) -> Telemetry {
        self.detached.store(true, Ordering::Release);
        for task in self.tasks.drain(..) {
            task.abort();
        }
        // `try_lock` is safe here: listener tasks have been aborted, so no
        // other task can be holding the lock by the time we reach this point.
        match self.shared.try_lock() {
            Ok(guard) => guard.telemetry.clone(),
            Err(_) => Telemetry::default(),
        }
    }
}

#[derive(Clone)]
pub struct BlockRecorder {
    shared: Arc<Mutex<Shared>>,
    detached: Arc<AtomicBool>,
    nav_start: Instant,
}

impl BlockRecorder {
    pub async fn record_blocked(&self, request_id: String, url: String, method: String, resource_type: ResourceType) {
        if self.detached.load(Ordering::Acquire) {
            return;
        }
        let offset = self.nav_start.elapsed().as_millis() as u64;
        let mut guard = self.shared.lock().await;
        guard.telemetry.network.push(NetworkEntry {
            id: request_id,
            url,
            method,
            resource_type,
            status: None,
            bytes: 0,
            duration_ms: None,
            blocked: true,
            failed: false,
            start_offset_ms: offset,
        });
    }
}

impl Drop for EventCollector {
    fn drop(&mut self) {
        self.detached.store(true, Ordering::Release);
        for task in &self.tasks {
            task.abort();
        }
    }
}

macro_rules! listener_fn {
    ($name:ident, $event:ty, $handler:expr) => {
        async fn $name(
            page: &Page,
            shared: Arc<Mutex<Shared>>,
            detached: Arc<AtomicBool>,
            nav_start: Instant,
        ) -> anyhow::Result<JoinHandle<()>> {
            let mut stream = page.event_listener::<$event>().await?;
            Ok(tokio::spawn(async move {
                while let Some(event) = stream.next().await {
                    if detached.load(Ordering::Acquire) {
                        break;
                    }
                    let offset = nav_start.elapsed().as_millis() as u64;
                    let mut guard = shared.lock().await;
                    $handler(&mut guard.telemetry, &event, offset);
                }
            }))
        }
    };
}

listener_fn!(spawn_request_listener, EventRequestWillBeSent, |t: &mut Telemetry, e: &EventRequestWillBeSent, offset: u64| {
    t.network.push(NetworkEntry {
        id: e.request_id.inner().to_string(),
        url: e.request.url.clone(),
        method: e.request.method.clone(),
        resource_type: e.r#type.as_ref().map(|rt| ResourceType::from_cdp(rt.as_ref())).unwrap_or(ResourceType::Other),
        status: None,
        bytes: 0,
        duration_ms: None,
        blocked: false,
        failed: false,
        start_offset_ms: offset,
    });
});

listener_fn!(spawn_response_listener, EventResponseReceived, |t: &mut Telemetry, e: &EventResponseReceived, _offset: u64| {
    let id = e.request_id.inner().to_string();
    if let Some(entry) = t.network.iter_mut().find(|n| n.id == id) {
        entry.status = Some(e.response.status as u16);
    }
});

listener_fn!(spawn_finished_listener, EventLoadingFinished, |t: &mut Telemetry, e: &EventLoadingFinished, offset: u64| {
    let id = e.request_id.inner().to_string();
    if let Some(entry) = t.network.iter_mut().find(|n| n.id == id) {
        entry.bytes = e.encoded_data_length as u64;
        entry.duration_ms = offset.checked_sub(entry.start_offset_ms);
    }
});

listener_fn!(spawn_failed_listener, EventLoadingFailed, |t: &mut Telemetry, e: &EventLoadingFailed, _offset: u64| {
    let id = e.request_id.inner().to_string();
    if let Some(entry) = t.network.iter_mut().find(|n| n.id == id) {
        entry.failed = true;
    }
});

async fn spawn_console_listener(
    page: &Page,
    shared: Arc<Mutex<Shared>>,
    detached: Arc<AtomicBool>,
    nav_start: Instant,
) -> anyhow::Result<JoinHandle<()>> {
    let mut stream = page.event_listener::<EventConsoleApiCalled>().await?;
    Ok(tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            if detached.load(Ordering::Acquire) {
                break;
            }
            let offset = nav_start.elapsed().as_millis() as u64;
            let level = match event.r#type.as_ref() {
                "warning" => ConsoleLevel::Warn,
                "error" => ConsoleLevel::Error,
                _ => ConsoleLevel::Log,
            };
            let message = event
                .args
                .iter()
                .filter_map(|a| a.value.as_ref().map(|v| v.to_string()))
                .collect::<Vec<_>>()
                .join(" ");
            shared.lock().await.telemetry.console.push(ConsoleMessage { level, message, offset_ms: offset });
        }
    }))
}

async fn spawn_exception_listener(
    page: &Page,
    shared: Arc<Mutex<Shared>>,
    detached: Arc<AtomicBool>,
    nav_start: Instant,
) -> anyhow::Result<JoinHandle<()>> {
    let mut stream = page.event_listener::<EventExceptionThrown>().await?;
    Ok(tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            if detached.load(Ordering::Acquire) {
                break;
            }
            let offset = nav_start.elapsed().as_millis() as u64;
            let details = &event.exception_details;
            let message = details
                .exception
                .as_ref()
                .and_then(|e| e.description.clone())
                .unwrap_or_else(|| details.text.clone());
            let stack = details.stack_trace.as_ref().map(|s| format!("{s:?}"));
            shared.lock().await.telemetry.js_errors.push(JsError { message, stack, offset_ms: offset });
        }
    }))
}

async fn spawn_dcl_listener(
    page: &Page,
    shared: Arc<Mutex<Shared>>,
    detached: Arc<AtomicBool>,
    nav_start: Instant,
) -> anyhow::Result<JoinHandle<()>> {
    let mut stream = page.event_listener::<EventDomContentEventFired>().await?;
    Ok(tokio::spawn(async move {
        if let Some(_event) = stream.next().await
            && !detached.load(Ordering::Acquire)
        {
            let offset = nav_start.elapsed().as_millis() as u64;
            shared.lock().await.telemetry.lifecycle.dom_content_loaded_ms = Some(offset);
        }
    }))
}

async fn spawn_load_listener(
    page: &Page,
    shared: Arc<Mutex<Shared>>,
    detached: Arc<AtomicBool>,
    nav_start: Instant,
) -> anyhow::Result<JoinHandle<()>> {
    let mut stream = page.event_listener::<EventLoadEventFired>().await?;
    Ok(tokio::spawn(async move {
        if let Some(_event) = stream.next().await
            && !detached.load(Ordering::Acquire)
        {
            let offset = nav_start.elapsed().as_millis() as u64;
            shared.lock().await.telemetry.lifecycle.load_ms = Some(offset);
        }
    }))
}
