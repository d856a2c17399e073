//! Short-TTL memoization of primary provider lookups.
//!
//! Purely a rate-limiting optimization: failures are cached too (as `None`)
//! so a flapping provider is not hammered, and nothing here ever propagates
//! an error — resolution falls through to its fallbacks on `None`.

use super::provider::SongProvider;
use super::SongRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

pub const SONG_CACHE_TTL: Duration = Duration::from_secs(300);

struct CacheSlot {
    fetched_at: Instant,
    record: Option<Arc<SongRecord>>,
}

/// TTL cache in front of [`SongProvider::get_song`].
pub struct SongCache {
    provider: Option<Arc<dyn SongProvider>>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheSlot>>,
}

impl SongCache {
    pub fn new(provider: Option<Arc<dyn SongProvider>>) -> Self {
        Self::with_ttl(provider, SONG_CACHE_TTL)
    }

    pub fn with_ttl(provider: Option<Arc<dyn SongProvider>>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached record when fresh (cached failures included),
    /// otherwise ask the provider and cache whatever happens.
    pub async fn get_or_fetch(&self, track_id: &str) -> Option<Arc<SongRecord>> {
        {
            let entries = self.entries.lock().unwrap();
            if let Some(slot) = entries.get(track_id) {
                if slot.fetched_at.elapsed() < self.ttl {
                    return slot.record.clone();
                }
            }
        }

        // Not held across the provider call; a concurrent miss costs one
        // redundant request, last write wins.
        let record = match &self.provider {
            Some(provider) => match provider.get_song(track_id).await {
                Ok(record) => Some(Arc::new(record)),
                Err(e) => {
                    warn!("Song lookup failed for {}: {}", track_id, e);
                    None
                }
            },
            None => None,
        };

        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            track_id.to_string(),
            CacheSlot {
                fetched_at: Instant::now(),
                record: record.clone(),
            },
        );
        record
    }
}
