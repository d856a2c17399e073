//! The download state machine.
//!
//! Serializes per-track work behind the lock table, invokes the external
//! fetch-and-transcode tool, locates its output, promotes it atomically to
//! the canonical cache name and hands the result to the tag writer. Metadata
//! and tagging problems degrade; only the fetch/promote path can fail an
//! attempt.

use super::filename::{make_filename, AUDIO_EXT};
use super::lock_table::DownloadLocks;
use crate::fetcher::{AudioFetcher, RawTrackInfo};
use crate::metadata::{MetadataResolver, ResolvedTrack};
use crate::tags::TagWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("cache directory unavailable: {0}")]
    DirectoryUnavailable(#[source] std::io::Error),

    #[error("timed out waiting for the download lock")]
    LockTimeout,

    #[error("fetch-and-transcode failed: {0}")]
    FetchFailed(#[source] crate::fetcher::FetchError),

    #[error("no transcoded output found for {0}")]
    OutputNotFound(String),

    #[error("failed to promote output to its cache name: {0}")]
    PromoteFailed(#[source] std::io::Error),
}

/// Timing knobs of the pipeline; the defaults are the production values.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Bound on waiting for the per-track lock.
    pub lock_wait: Duration,
    /// Polling attempts while waiting for the tool's output file.
    pub poll_attempts: u32,
    /// Delay between polling attempts.
    pub poll_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_secs(30),
            poll_attempts: 30,
            poll_interval: Duration::from_millis(150),
        }
    }
}

/// Owns the cache directory and everything needed to fill it.
///
/// Constructed once at startup and shared; request handlers call
/// [`DownloadPipeline::download`] directly or from spawned background tasks.
pub struct DownloadPipeline {
    cache_dir: PathBuf,
    settings: PipelineSettings,
    locks: DownloadLocks,
    resolver: MetadataResolver,
    fetcher: Arc<dyn AudioFetcher>,
    tag_writer: TagWriter,
}

impl DownloadPipeline {
    pub fn new(
        cache_dir: PathBuf,
        resolver: MetadataResolver,
        fetcher: Arc<dyn AudioFetcher>,
        tag_writer: TagWriter,
    ) -> Self {
        Self::with_settings(
            cache_dir,
            resolver,
            fetcher,
            tag_writer,
            PipelineSettings::default(),
        )
    }

    pub fn with_settings(
        cache_dir: PathBuf,
        resolver: MetadataResolver,
        fetcher: Arc<dyn AudioFetcher>,
        tag_writer: TagWriter,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            cache_dir,
            settings,
            locks: DownloadLocks::new(),
            resolver,
            fetcher,
            tag_writer,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Whether a download for this track currently holds its lock.
    pub fn is_in_progress(&self, track_id: &str) -> bool {
        self.locks.is_busy(track_id)
    }

    /// Resolve metadata and return the canonical cache path for this track,
    /// whether or not the file exists yet.
    pub async fn canonical_path(&self, track_id: &str) -> (ResolvedTrack, PathBuf) {
        let resolved = self.resolver.resolve(track_id).await;
        let filename = make_filename(&resolved.title, &resolved.artists_display());
        let path = self.cache_dir.join(filename);
        (resolved, path)
    }

    /// Download one track into the cache and return the canonical path.
    ///
    /// Exactly one attempt per track runs at a time; concurrent callers wait
    /// on the lock and usually land on the existing-file short-circuit.
    pub async fn download(&self, track_id: &str) -> Result<PathBuf, DownloadError> {
        info!("[{}] Starting download", track_id);

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| {
                error!("[{}] Cannot create cache dir: {}", track_id, e);
                DownloadError::DirectoryUnavailable(e)
            })?;

        // sole exclusion mechanism; the guard releases on every exit path
        let _guard = self
            .locks
            .acquire(track_id, self.settings.lock_wait)
            .await
            .ok_or_else(|| {
                error!("[{}] Could not acquire download lock", track_id);
                DownloadError::LockTimeout
            })?;

        let (_, final_path) = self.canonical_path(track_id).await;

        if tokio::fs::try_exists(&final_path).await.unwrap_or(false) {
            info!("[{}] Using cached file: {:?}", track_id, final_path);
            return Ok(final_path);
        }

        // the tool does not know the resolved title yet, temp output is
        // keyed by the raw identifier
        let template = self.cache_dir.join(format!("{}.%(ext)s", track_id));
        info!("[{}] Running fetch-and-transcode", track_id);
        let raw_info = match self.fetcher.fetch(track_id, &template).await {
            Ok(info) => Some(info),
            Err(e) => {
                error!("[{}] Fetch-and-transcode failed: {}", track_id, e);
                return Err(DownloadError::FetchFailed(e));
            }
        };

        let temp_path = match self.locate_output(track_id, raw_info.as_ref()).await {
            Some(path) => path,
            None => {
                error!(
                    "[{}] No output produced. Cache contents: {:?}",
                    track_id,
                    list_dir(&self.cache_dir).await
                );
                return Err(DownloadError::OutputNotFound(track_id.to_string()));
            }
        };
        info!("[{}] Located temp output: {:?}", track_id, temp_path);

        if temp_path != final_path {
            promote(&temp_path, &final_path).await.map_err(|e| {
                error!("[{}] Promotion failed: {}", track_id, e);
                DownloadError::PromoteFailed(e)
            })?;
            info!("[{}] Promoted to {:?}", track_id, final_path);
        }

        self.cleanup_leftovers(track_id, &final_path).await;

        let record = self.resolver.song_record(track_id).await;
        if let Err(e) = self
            .tag_writer
            .write_tags(&final_path, record.as_deref(), raw_info.as_ref())
            .await
        {
            // the audio file is already a valid cache entry
            warn!("[{}] Tag writing failed: {}", track_id, e);
        }

        info!("[{}] Download completed: {:?}", track_id, final_path);
        Ok(final_path)
    }

    /// Find the tool's transcoded output: its own predicted path first, then
    /// bounded polling for an identifier-prefixed file, newest first.
    async fn locate_output(
        &self,
        track_id: &str,
        raw_info: Option<&RawTrackInfo>,
    ) -> Option<PathBuf> {
        if let Some(predicted) = raw_info.and_then(RawTrackInfo::predicted_output) {
            if tokio::fs::try_exists(&predicted).await.unwrap_or(false) {
                return Some(predicted);
            }
        }

        for attempt in 0..self.settings.poll_attempts {
            if let Some(found) = self.newest_prefixed_output(track_id).await {
                return Some(found);
            }
            if attempt + 1 < self.settings.poll_attempts {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }
        None
    }

    async fn newest_prefixed_output(&self, track_id: &str) -> Option<PathBuf> {
        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(track_id) || !name.ends_with(&format!(".{}", AUDIO_EXT)) {
                continue;
            }
            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(time) => time,
                Err(_) => continue,
            };
            if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
                newest = Some((modified, entry.path()));
            }
        }
        newest.map(|(_, path)| path)
    }

    /// Remove leftover temp artifacts sharing the identifier prefix.
    async fn cleanup_leftovers(&self, track_id: &str, final_path: &Path) {
        let Ok(mut entries) = tokio::fs::read_dir(&self.cache_dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path == final_path {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(track_id) {
                let _ = tokio::fs::remove_file(&path).await;
            }
        }
    }
}

/// Atomic rename, falling back to copy-then-delete across filesystems.
async fn promote(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!("Rename failed ({}), falling back to copy", e);
            tokio::fs::copy(from, to).await?;
            let _ = tokio::fs::remove_file(from).await;
            Ok(())
        }
    }
}

async fn list_dir(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names
}
