//! Time-based cache eviction.
//!
//! Cached tracks only need to live long enough for the device to pull them;
//! a sweep deletes audio files past their TTL. Safe next to active downloads:
//! in-flight files are far younger than the threshold, and promoted files are
//! complete by construction.

use crate::pipeline::AUDIO_EXT;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Age past which a cache entry is evicted.
pub const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Delete cached audio files older than `ttl`; returns the deletion count.
/// Per-file problems are logged and skipped.
pub async fn sweep(cache_dir: &Path, ttl: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(cache_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Cache sweep cannot read {:?}: {}", cache_dir, e);
            return 0;
        }
    };

    let mut deleted = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(AUDIO_EXT) {
            continue;
        }
        if !is_older_than(&path, ttl).await {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                deleted += 1;
                info!("Evicted stale cache file: {:?}", path.file_name());
            }
            Err(e) => warn!("Failed to evict {:?}: {}", path, e),
        }
    }

    if deleted > 0 {
        info!("Cache sweep evicted {} file(s)", deleted);
    }
    deleted
}

async fn is_older_than(path: &PathBuf, ttl: Duration) -> bool {
    let Ok(metadata) = tokio::fs::metadata(path).await else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    modified.elapsed().map(|age| age > ttl).unwrap_or(false)
}

/// Spawn the periodic sweep task. The first tick fires immediately, so the
/// cache is also cleaned at startup.
pub fn spawn(cache_dir: PathBuf, ttl: Duration, interval: Duration) -> JoinHandle<()> {
    info!(
        "Cache eviction enabled: TTL {:?}, sweeping every {:?}",
        ttl, interval
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            sweep(&cache_dir, ttl).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweep_deletes_expired_audio() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("old.mp3");
        std::fs::write(&stale, b"bytes").unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let deleted = sweep(dir.path(), Duration::ZERO).await;
        assert_eq!(deleted, 1);
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_sweep_retains_fresh_audio() {
        let dir = TempDir::new().unwrap();
        let fresh = dir.path().join("fresh.mp3");
        std::fs::write(&fresh, b"bytes").unwrap();

        let deleted = sweep(dir.path(), Duration::from_secs(5 * 60)).await;
        assert_eq!(deleted, 0);
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_sweep_ignores_other_extensions() {
        let dir = TempDir::new().unwrap();
        let other = dir.path().join("notes.txt");
        let partial = dir.path().join("abc123.webm");
        std::fs::write(&other, b"keep").unwrap();
        std::fs::write(&partial, b"keep").unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let deleted = sweep(dir.path(), Duration::ZERO).await;
        assert_eq!(deleted, 0);
        assert!(other.exists());
        assert!(partial.exists());
    }

    #[tokio::test]
    async fn test_sweep_missing_dir_is_harmless() {
        let deleted = sweep(Path::new("/nonexistent/cache/dir"), CACHE_TTL).await;
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_sweep_mixed_ages() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("stale.mp3");
        std::fs::write(&stale, b"bytes").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = dir.path().join("fresh.mp3");
        std::fs::write(&fresh, b"bytes").unwrap();

        let deleted = sweep(dir.path(), Duration::from_millis(25)).await;
        assert_eq!(deleted, 1);
        assert!(!stale.exists());
        assert!(fresh.exists());
    }
}
