//! Per-request progress channel, single subscriber via SSE, drop policy
//! when the subscriber is slow. Uses a `DashMap` of per-request bounded
//! channels rather than one global broadcast bus, so each `request_id`
//! gets an isolated stream instead of sharing one with every other
//! in-flight render.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Started { url: String },
    Navigating { url: String },
    Waiting { wait_event: String, elapsed_ms: u64 },
    Capturing { request_count: usize },
    Parsing {},
    Complete { render_time: f64 },
    Error { code: String, message: String },
}

impl ProgressEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

#[derive(Default)]
pub struct ProgressBus {
    channels: DashMap<String, mpsc::Sender<ProgressEvent>>,
}

impl ProgressBus {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a buffered channel for `request_id`; a second subscribe for
    /// the same id closes the prior channel (the old sender is dropped,
    /// which ends that receiver's stream).
    pub fn subscribe(&self, request_id: String) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.channels.insert(request_id, tx);
        rx
    }

    /// Non-blocking publish: if the buffer is full, drop the event and log it.
    pub fn publish(&self, request_id: &str, event: ProgressEvent) {
        let terminal = event.is_terminal();
        if let Some(sender) = self.channels.get(request_id) {
            match sender.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(request_id, "progress event dropped: subscriber buffer full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(request_id, "progress event dropped: no subscriber");
                }
            }
        }
        if terminal {
            self.unsubscribe(request_id);
        }
    }

    pub fn unsubscribe(&self, request_id: &str) {
        self.channels.remove(request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscriber_is_a_noop() {
        let bus = ProgressBus::new();
        bus.publish("missing", ProgressEvent::Started { url: "https://example.com".into() });
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe("req-1".to_string());
        bus.publish("req-1", ProgressEvent::Started { url: "https://example.com".into() });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ProgressEvent::Started { .. }));
    }

    #[tokio::test]
    async fn terminal_event_closes_channel() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe("req-1".to_string());
        bus.publish("req-1", ProgressEvent::Complete { render_time: 0.5 });
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn resubscribe_closes_prior_channel() {
        let bus = ProgressBus::new();
        let mut rx1 = bus.subscribe("req-1".to_string());
        let _rx2 = bus.subscribe("req-1".to_string());
        assert!(rx1.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_buffer_drops_events_without_blocking() {
        let bus = ProgressBus::new();
        let _rx = bus.subscribe("req-1".to_string());
        for _ in 0..(CHANNEL_CAPACITY + 5) {
            bus.publish("req-1", ProgressEvent::Capturing { request_count: 1 });
        }
    }
}
