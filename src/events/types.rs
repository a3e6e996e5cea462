//! Event payloads produced by the event collector for one navigation. All
//! offsets are relative to navigation-start.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkEntry {
    pub id: String,
    pub url: String,
    pub method: String,
    pub resource_type: crate::blocklist::ResourceType,
    pub status: Option<u16>,
    pub bytes: u64,
    pub duration_ms: Option<u64>,
    pub blocked: bool,
    pub failed: bool,
    pub start_offset_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    pub offset_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsError {
    pub message: String,
    pub stack: Option<String>,
    pub offset_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Lifecycle {
    pub dom_content_loaded_ms: Option<u64>,
    pub load_ms: Option<u64>,
    pub first_paint_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Telemetry {
    pub network: Vec<NetworkEntry>,
    pub console: Vec<ConsoleMessage>,
    pub js_errors: Vec<JsError>,
    pub lifecycle: Lifecycle,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkCounts {
    pub total: usize,
    pub blocked: usize,
    pub failed: usize,
    pub total_bytes: u64,
}

impl Telemetry {
    #[must_use]
    pub fn network_counts(&self) -> NetworkCounts {
        let mut counts = NetworkCounts::default();
        for entry in &self.network {
            counts.total += 1;
            if entry.blocked {
                counts.blocked += 1;
            }
            if entry.failed {
                counts.failed += 1;
            }
            counts.total_bytes += entry.bytes;
        }
        counts
    }

    /// Number of requests currently in flight (seen but neither finished
    /// nor failed yet) — used by the renderer's `networkIdle` wait.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.network.iter().filter(|e| e.status.is_none() && !e.blocked && !e.failed).count()
    }
}
