//! ID3 tag writing for cached tracks.
//!
//! Replaces the descriptive tags of an already-transcoded file and embeds the
//! device thumbnail, leaving the audio stream untouched. Field values fall
//! back from the provider record to the raw tool info to hard defaults, and
//! nothing in here is allowed to take a finished download with it.

use crate::cover::CoverTransformer;
use crate::fetcher::RawTrackInfo;
use crate::metadata::{SongRecord, UNKNOWN_ARTIST};
use id3::{Tag, TagLike, Version};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TagWriteError {
    #[error("failed to save tags: {0}")]
    Save(#[from] id3::Error),

    #[error("tag write task failed")]
    TaskFailed,
}

/// Resolved values for one tag write, computed before touching the file.
#[derive(Debug, Default)]
struct TagFields {
    title: Option<String>,
    artists: Vec<String>,
    album: Option<String>,
    year: Option<i32>,
    cover: Option<Vec<u8>>,
}

/// Writes descriptive tags and cover art onto cached files.
pub struct TagWriter {
    cover: Arc<CoverTransformer>,
}

impl TagWriter {
    pub fn new(cover: Arc<CoverTransformer>) -> Self {
        Self { cover }
    }

    /// Write tags on `audio_path` from the provider record and the raw tool
    /// info. Cover embedding is best-effort; a save failure is the only error
    /// surfaced, and callers are expected to log rather than abort on it.
    pub async fn write_tags(
        &self,
        audio_path: &Path,
        record: Option<&SongRecord>,
        raw: Option<&RawTrackInfo>,
    ) -> Result<(), TagWriteError> {
        let mut fields = gather_fields(audio_path, record, raw);

        if let Some(url) = cover_url(record, raw) {
            fields.cover = self.cover.build_thumbnail(&url).await;
        } else {
            debug!("No cover URL available for {:?}", audio_path);
        }

        let path = audio_path.to_path_buf();
        tokio::task::spawn_blocking(move || write_fields(&path, fields))
            .await
            .map_err(|_| TagWriteError::TaskFailed)??;

        info!("Metadata written to {:?}", audio_path);
        Ok(())
    }
}

/// Cover source priority: raw tool thumbnail, then the record's
/// highest-resolution thumbnail (nested details included).
fn cover_url(record: Option<&SongRecord>, raw: Option<&RawTrackInfo>) -> Option<String> {
    raw.and_then(|r| r.thumbnail.clone())
        .filter(|u| !u.is_empty())
        .or_else(|| record.and_then(SongRecord::best_thumbnail_url))
}

fn gather_fields(
    audio_path: &Path,
    record: Option<&SongRecord>,
    raw: Option<&RawTrackInfo>,
) -> TagFields {
    let title = record
        .and_then(|r| r.title.clone())
        .filter(|t| !t.is_empty())
        .or_else(|| raw.and_then(|r| r.title.clone()).filter(|t| !t.is_empty()))
        .or_else(|| {
            audio_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        });

    let mut artists = record.map(SongRecord::artist_names).unwrap_or_default();
    if artists.is_empty() {
        if let Some(raw) = raw {
            artists = raw.fallback_artists();
        }
    }
    if artists.is_empty() {
        artists = vec![UNKNOWN_ARTIST.to_string()];
    }

    let album = record
        .and_then(|r| r.album.as_ref())
        .and_then(|a| a.display_name())
        .or_else(|| raw.and_then(RawTrackInfo::fallback_album));

    let year = record
        .and_then(|r| r.year.as_ref())
        .map(|y| y.display())
        .or_else(|| raw.and_then(RawTrackInfo::fallback_year))
        .and_then(|y| y.trim().parse::<i32>().ok());

    TagFields {
        title,
        artists,
        album,
        year,
        cover: None,
    }
}

fn write_fields(path: &Path, fields: TagFields) -> Result<(), TagWriteError> {
    // keep whatever container is already there, only our fields are replaced
    let mut tag = Tag::read_from_path(path).unwrap_or_else(|_| Tag::new());

    if let Some(title) = fields.title {
        tag.set_title(title);
    }
    tag.set_artist(fields.artists.join(", "));
    if let Some(album) = fields.album {
        tag.set_album(album);
    }
    if let Some(year) = fields.year {
        tag.set_year(year);
    }
    if let Some(cover) = fields.cover {
        tag.remove_all_pictures();
        tag.add_frame(id3::frame::Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: id3::frame::PictureType::CoverFront,
            description: "Cover".to_string(),
            data: cover,
        });
    }

    tag.write_to_path(path, Version::Id3v24)?;
    Ok(())
}
