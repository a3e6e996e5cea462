//! Event plumbing for one navigation: the event collector (network /
//! console / lifecycle capture) and the progress bus (per-request SSE
//! progress). Grouped together because both deal in events raised during a
//! single render.

pub mod collector;
pub mod progress;
pub mod types;

pub use collector::{BlockRecorder, EventCollector};
pub use progress::{ProgressBus, ProgressEvent};
pub use types::{ConsoleLevel, ConsoleMessage, JsError, Lifecycle, NetworkEntry, Telemetry};
