//! Wire types for the primary metadata provider.

use serde::Deserialize;

/// One artist entry in a song record: either a structured object or a bare
/// name string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArtistEntry {
    Structured(StructuredArtist),
    Raw(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredArtist {
    pub name: Option<String>,
    pub artist: Option<String>,
    #[serde(rename = "browseId")]
    pub browse_id: Option<String>,
}

impl ArtistEntry {
    /// Display name: `name`, else `artist`, else `browseId` for structured
    /// entries; the string itself for raw ones. Empty values count as absent.
    pub fn display_name(&self) -> Option<String> {
        let name = match self {
            ArtistEntry::Structured(s) => s
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .or_else(|| s.artist.clone().filter(|n| !n.is_empty()))
                .or_else(|| s.browse_id.clone().filter(|n| !n.is_empty())),
            ArtistEntry::Raw(s) => Some(s.clone()),
        };
        name.filter(|n| !n.is_empty())
    }
}

/// An album reference: structured with a name, or a bare string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AlbumRef {
    Structured { name: Option<String> },
    Raw(String),
}

impl AlbumRef {
    pub fn display_name(&self) -> Option<String> {
        let name = match self {
            AlbumRef::Structured { name } => name.clone(),
            AlbumRef::Raw(s) => Some(s.clone()),
        };
        name.filter(|n| !n.is_empty())
    }
}

/// A year that providers serialize as either a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(i64),
    Text(String),
}

impl Year {
    pub fn display(&self) -> String {
        match self {
            Year::Number(n) => n.to_string(),
            Year::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnail {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Nested per-video details carried alongside the song fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoDetails {
    pub title: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
}

/// A structured song record as returned by the primary provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongRecord {
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistEntry>,
    pub album: Option<AlbumRef>,
    pub year: Option<Year>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(rename = "videoDetails")]
    pub video_details: Option<VideoDetails>,
}

impl SongRecord {
    /// Artist display names in record order, empty entries dropped.
    pub fn artist_names(&self) -> Vec<String> {
        self.artists
            .iter()
            .filter_map(ArtistEntry::display_name)
            .collect()
    }

    /// Thumbnail URL by the highest-resolution-last convention, falling back
    /// to the nested video details.
    pub fn best_thumbnail_url(&self) -> Option<String> {
        self.thumbnails
            .last()
            .and_then(|t| t.url.clone())
            .filter(|u| !u.is_empty())
            .or_else(|| {
                self.video_details
                    .as_ref()
                    .and_then(|vd| vd.thumbnail.clone())
                    .filter(|u| !u.is_empty())
            })
    }
}

/// One entry of a provider search reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEntry {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistEntry>,
    pub duration: Option<String>,
    pub album: Option<AlbumRef>,
}
