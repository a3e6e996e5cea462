//! Drives one acquired browser instance through a single navigation.
//! Modeled as a pure function over `(page, url, RenderOptions)` rather than
//! a long-lived object — it owns no state beyond the one call.
//!
//! The interception handler follows the CDP `Fetch` domain request/response
//! pattern, narrowed to two outcomes: continue, or fail-and-record.

pub mod types;

pub use types::{RenderOptions, RenderResult, WaitEvent};

use crate::blocklist::ResourceType;
use crate::errors::RenderError;
use crate::events::EventCollector;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused, FailRequestParams,
    RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, ErrorReason,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::warn;

const IDLE_QUIET_WINDOW: Duration = Duration::from_millis(500);
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub async fn render(page: &Page, url: &str, opts: &RenderOptions) -> Result<RenderResult, RenderError> {
    let render_start = Instant::now();
    let deadline = render_start + opts.timeout;

    page.execute(FetchEnableParams {
        patterns: Some(vec![RequestPattern {
            url_pattern: Some("*".to_string()),
            resource_type: None,
            request_stage: Some(RequestStage::Request),
        }]),
        handle_auth_requests: Some(false),
    })
    .await
    .map_err(|e| RenderError::RenderFailed(format!("failed to enable request interception: {e}")))?;
    page.execute(NetworkEnableParams::default())
        .await
        .map_err(|e| RenderError::RenderFailed(format!("failed to enable network events: {e}")))?;

    if let Some(ua) = resolve_viewport_and_ua(page, &opts.user_agent).await {
        return Err(RenderError::RenderFailed(ua));
    }

    let nav_start = Instant::now();
    let collector =
        EventCollector::attach(page, nav_start).await.map_err(|e| RenderError::RenderFailed(e.to_string()))?;
    let intercept_task = spawn_interception(page, opts, collector.block_recorder());

    let nav_result = tokio::time::timeout_at(deadline.into(), page.goto(url)).await;
    match nav_result {
        Err(_) => {
            intercept_task.abort();
            collector.detach();
            return Err(RenderError::RenderTimeout);
        }
        Ok(Err(e)) => {
            intercept_task.abort();
            collector.detach();
            let message = e.to_string();
            if message.contains("ERR_NAME_NOT_RESOLVED") {
                return Err(RenderError::DomainNotFound(message));
            }
            return Err(RenderError::RenderFailed(message));
        }
        Ok(Ok(_)) => {}
    }

    wait_for_event(&collector, opts.wait_event, deadline).await;

    let final_url = page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());
    let status_code = collector.document_status(&final_url).await;

    let html = page.content().await.unwrap_or_default();
    let page_size_bytes = html.len() as u64;

    let screenshot = if opts.include_screenshot {
        capture_screenshot(page).await
    } else {
        None
    };

    intercept_task.abort();
    let telemetry = collector.detach();
    let render_time = render_start.elapsed().as_secs_f64();

    Ok(RenderResult {
        status_code,
        final_url,
        redirect_url: None,
        page_size_bytes,
        render_time,
        html,
        screenshot,
        telemetry,
    })
}

/// Set the user agent and a viewport matching mobile vs. desktop UA
/// detection. Returns `Some(message)` on CDP failure.
async fn resolve_viewport_and_ua(page: &Page, user_agent: &str) -> Option<String> {
    use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
    use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;

    let ua_params = SetUserAgentOverrideParams {
        user_agent: user_agent.to_string(),
        accept_language: None,
        platform: None,
        user_agent_metadata: None,
    };
    if let Err(e) = page.execute(ua_params).await {
        return Some(format!("failed to set user agent: {e}"));
    }

    let is_mobile = crate::utils::constants::is_mobile_user_agent(user_agent);
    let (width, height) = if is_mobile { (390, 844) } else { (1920, 1080) };
    let metrics_params = match SetDeviceMetricsOverrideParams::builder()
        .width(width)
        .height(height)
        .device_scale_factor(1.0)
        .mobile(is_mobile)
        .build()
    {
        Ok(params) => params,
        Err(e) => return Some(format!("failed to build viewport params: {e}")),
    };
    if let Err(e) = page.execute(metrics_params).await {
        return Some(format!("failed to set viewport: {e}"));
    }
    None
}

fn spawn_interception(
    page: &Page,
    opts: &RenderOptions,
    recorder: crate::events::BlockRecorder,
) -> JoinHandle<()> {
    let page = page.clone();
    let blocklist = opts.blocklist.clone();
    tokio::spawn(async move {
        let mut paused = match page.event_listener::<EventRequestPaused>().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "failed to subscribe to Fetch.requestPaused");
                return;
            }
        };
        while let Some(event) = paused.next().await {
            let request = &event.request;
            let resource_type = ResourceType::from_cdp(&format!("{:?}", event.resource_type));

            if blocklist.should_block(&request.url, resource_type) {
                recorder
                    .record_blocked(event.request_id.inner().to_string(), request.url.clone(), request.method.clone(), resource_type)
                    .await;
                let _ = page
                    .execute(FailRequestParams {
                        request_id: event.request_id.clone(),
                        error_reason: ErrorReason::BlockedByClient,
                    })
                    .await;
            } else {
                let _ = page.execute(ContinueRequestParams::new(event.request_id.clone())).await;
            }
        }
    })
}

async fn wait_for_event(collector: &EventCollector, wait_event: WaitEvent, deadline: Instant) {
    loop {
        if Instant::now() >= deadline {
            return;
        }
        let satisfied = match wait_event {
            WaitEvent::DomContentLoaded => collector.lifecycle_snapshot().await.dom_content_loaded_ms.is_some(),
            WaitEvent::Load => collector.lifecycle_snapshot().await.load_ms.is_some(),
            WaitEvent::NetworkIdle => is_idle_for(collector, 0, deadline).await,
            WaitEvent::NetworkAlmostIdle => is_idle_for(collector, 1, deadline).await,
        };
        if satisfied {
            return;
        }
        tokio::time::sleep(IDLE_POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now()))).await;
    }
}

/// True once in-flight count stays `<= threshold` continuously for
/// [`IDLE_QUIET_WINDOW`], or the deadline is reached first.
async fn is_idle_for(collector: &EventCollector, threshold: usize, deadline: Instant) -> bool {
    let quiet_since = Instant::now();
    loop {
        if collector.in_flight_count().await > threshold {
            return false;
        }
        if Instant::now().duration_since(quiet_since) >= IDLE_QUIET_WINDOW {
            return true;
        }
        if Instant::now() >= deadline {
            return true;
        }
        tokio::time::sleep(IDLE_POLL_INTERVAL).await;
    }
}

async fn capture_screenshot(page: &Page) -> Option<Vec<u8>> {
    let params = CaptureScreenshotParams {
        format: Some(CaptureScreenshotFormat::Png),
        capture_beyond_viewport: Some(true),
        ..Default::default()
    };
    match page.screenshot(params).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %e, "screenshot capture failed");
            None
        }
    }
}
