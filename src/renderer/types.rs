//! Renderer input/output types. `RenderOptions` is the orchestrator's
//! normalized, already-validated view of a render request; `RenderResult`
//! carries the navigation outcome back up to it.

use crate::blocklist::Blocklist;
use crate::events::Telemetry;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEvent {
    DomContentLoaded,
    Load,
    NetworkIdle,
    NetworkAlmostIdle,
}

impl WaitEvent {
    /// Parse the wire token, rejecting anything outside the allowed set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "DOMContentLoaded" => Some(Self::DomContentLoaded),
            "load" => Some(Self::Load),
            "networkIdle" => Some(Self::NetworkIdle),
            "networkAlmostIdle" => Some(Self::NetworkAlmostIdle),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::Load => "load",
            Self::NetworkIdle => "networkIdle",
            Self::NetworkAlmostIdle => "networkAlmostIdle",
        }
    }
}

pub struct RenderOptions {
    pub user_agent: String,
    pub timeout: Duration,
    pub wait_event: WaitEvent,
    pub blocklist: Blocklist,
    pub include_screenshot: bool,
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub status_code: Option<u16>,
    pub final_url: String,
    pub redirect_url: Option<String>,
    pub page_size_bytes: u64,
    pub render_time: f64,
    pub html: String,
    pub screenshot: Option<Vec<u8>>,
    pub telemetry: Telemetry,
}
