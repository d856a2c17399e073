//! Layered title/artist resolution.
//!
//! Resolution is total: whatever the providers do, the caller always gets a
//! non-empty title and at least one artist name. The canonical cache filename
//! is derived from this output, so it has to be deterministic for a given
//! provider state.

use super::cache::SongCache;
use super::SongRecord;
use crate::fetcher::AudioFetcher;
use std::sync::Arc;
use tracing::debug;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Canonical (title, artists) pair for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub title: String,
    pub artists: Vec<String>,
}

impl ResolvedTrack {
    /// Artists joined into the single display string used in filenames.
    pub fn artists_display(&self) -> String {
        self.artists.join(", ")
    }
}

/// Resolves track metadata through the primary provider, the external tool's
/// metadata-only probe, and ultimate fallbacks, in that order.
pub struct MetadataResolver {
    song_cache: Arc<SongCache>,
    fetcher: Arc<dyn AudioFetcher>,
}

impl MetadataResolver {
    pub fn new(song_cache: Arc<SongCache>, fetcher: Arc<dyn AudioFetcher>) -> Self {
        Self {
            song_cache,
            fetcher,
        }
    }

    /// The primary provider's record for this track, if any (cached).
    pub async fn song_record(&self, track_id: &str) -> Option<Arc<SongRecord>> {
        self.song_cache.get_or_fetch(track_id).await
    }

    /// Resolve a track to a usable (title, artists) pair. Never fails; each
    /// step only fills fields the previous steps left empty.
    pub async fn resolve(&self, track_id: &str) -> ResolvedTrack {
        let mut title: Option<String> = None;
        let mut artists: Vec<String> = Vec::new();

        if let Some(record) = self.song_cache.get_or_fetch(track_id).await {
            title = record.title.clone().filter(|t| !t.is_empty()).or_else(|| {
                record
                    .video_details
                    .as_ref()
                    .and_then(|vd| vd.title.clone())
                    .filter(|t| !t.is_empty())
            });

            artists = record.artist_names();
            if artists.is_empty() {
                if let Some(author) = record
                    .video_details
                    .as_ref()
                    .and_then(|vd| vd.author.clone())
                    .filter(|a| !a.is_empty())
                {
                    artists = vec![author];
                }
            }
        }

        if title.is_none() || artists.is_empty() {
            debug!("Falling back to tool probe for {}", track_id);
            match self.fetcher.probe(track_id).await {
                Ok(info) => {
                    if title.is_none() {
                        title = info.title.clone().filter(|t| !t.is_empty());
                    }
                    if artists.is_empty() {
                        artists = info.fallback_artists();
                    }
                }
                Err(e) => {
                    debug!("Tool probe failed for {}: {}", track_id, e);
                }
            }
        }

        if artists.is_empty() {
            artists = vec![UNKNOWN_ARTIST.to_string()];
        }
        let title = title.unwrap_or_else(|| track_id.to_string());

        ResolvedTrack { title, artists }
    }
}
