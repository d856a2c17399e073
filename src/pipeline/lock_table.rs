//! Per-identifier download locks.
//!
//! One lazily-created async mutex per track identifier serializes all
//! download attempts for that track. Entries are never removed; the
//! identifier space is small relative to the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard for one in-flight download attempt; releasing is dropping.
pub type DownloadGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct DownloadLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl DownloadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, track_id: &str) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(track_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquire the lock for `track_id`, waiting at most `max_wait`.
    /// `None` means the wait timed out and the caller must give up.
    pub async fn acquire(&self, track_id: &str, max_wait: Duration) -> Option<DownloadGuard> {
        let entry = self.entry(track_id);
        tokio::time::timeout(max_wait, entry.lock_owned()).await.ok()
    }

    /// Whether a download for `track_id` currently holds the lock.
    ///
    /// Advisory only: the answer may be stale by the time it is used. The
    /// lock itself stays the single source of exclusion.
    pub fn is_busy(&self, track_id: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        match entries.get(track_id) {
            Some(entry) => entry.try_lock().is_err(),
            None => false,
        }
    }
}
