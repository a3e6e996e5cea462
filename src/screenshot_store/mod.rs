//! A TTL-keyed blob store for screenshot bytes: even though the external
//! API returns screenshots inline as base64, this indirection lets other,
//! non-core callers fetch by id. Uses a `DashMap`-backed per-key state
//! pattern, with a periodic sweep task run via `tokio::spawn` + `select!`
//! against a shutdown signal.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

pub struct ScreenshotStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl ScreenshotStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self { entries: DashMap::new(), ttl })
    }

    /// Store `bytes` under a fresh random id, valid for this store's TTL.
    #[must_use]
    pub fn put(&self, bytes: Vec<u8>) -> String {
        let id = Uuid::new_v4().to_string();
        self.entries.insert(id.clone(), Entry { bytes, expires_at: Instant::now() + self.ttl });
        id
    }

    /// Fetch by id. Returns `None` once the entry has expired, even if the
    /// sweep hasn't reclaimed it yet.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Vec<u8>> {
        let entry = self.entries.get(id)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.bytes.clone())
    }

    fn sweep(&self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let reclaimed = before - self.entries.len();
        if reclaimed > 0 {
            debug!(reclaimed, remaining = self.entries.len(), "screenshot store sweep reclaimed expired entries");
        }
    }
}

/// Spawn the background sweep task, stopped by dropping `shutdown` or
/// sending on it.
pub fn spawn_sweeper(store: Arc<ScreenshotStore>, interval: Duration, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => store.sweep(),
                _ = shutdown.changed() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let store = ScreenshotStore::new(Duration::from_secs(60));
        let id = store.put(vec![1, 2, 3]);
        assert_eq!(store.get(&id), Some(vec![1, 2, 3]));
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let store = ScreenshotStore::new(Duration::from_millis(0));
        let id = store.put(vec![1, 2, 3]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.get(&id), None);
    }

    #[test]
    fn unknown_id_returns_none() {
        let store = ScreenshotStore::new(Duration::from_secs(60));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn sweep_removes_expired_entries() {
        let store = ScreenshotStore::new(Duration::from_millis(0));
        store.put(vec![1]);
        std::thread::sleep(Duration::from_millis(5));
        store.sweep();
        assert_eq!(store.entries.len(), 0);
    }
}
