//! Wire types for the external fetch-and-transcode tool.

use serde::Deserialize;
use std::path::PathBuf;

/// A JSON field that may hold a single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flatten to a list, dropping empty values.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => {
                if s.is_empty() {
                    Vec::new()
                } else {
                    vec![s]
                }
            }
            OneOrMany::Many(items) => items.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }
}

/// Structured info reported by the external tool, both when downloading and
/// in metadata-only mode. All fields are best-effort.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrackInfo {
    pub title: Option<String>,
    pub artist: Option<OneOrMany>,
    pub uploader: Option<String>,
    pub uploader_id: Option<String>,
    pub creator: Option<String>,
    pub channel: Option<String>,
    pub channel_id: Option<String>,
    pub album: Option<String>,
    pub release: Option<String>,
    pub upload_date: Option<String>,
    pub thumbnail: Option<String>,
    /// Path the tool reports it wrote to, before post-processing renames the
    /// extension. See [`RawTrackInfo::predicted_output`].
    #[serde(rename = "_filename")]
    pub filename: Option<String>,
}

impl RawTrackInfo {
    /// Artist names from the prioritized fallback chain: artist, uploader,
    /// uploader-id, creator, channel, channel-id. First non-empty hit wins.
    pub fn fallback_artists(&self) -> Vec<String> {
        if let Some(artist) = self.artist.clone() {
            let names = artist.into_vec();
            if !names.is_empty() {
                return names;
            }
        }
        [
            &self.uploader,
            &self.uploader_id,
            &self.creator,
            &self.channel,
            &self.channel_id,
        ]
        .into_iter()
        .find_map(|field| field.clone().filter(|s| !s.is_empty()))
        .map(|name| vec![name])
        .unwrap_or_default()
    }

    /// Album from the album field, else the release field.
    pub fn fallback_album(&self) -> Option<String> {
        self.album
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.release.clone().filter(|s| !s.is_empty()))
    }

    /// Year as the first four characters of the upload date.
    pub fn fallback_year(&self) -> Option<String> {
        self.upload_date
            .as_ref()
            .filter(|d| d.len() >= 4)
            .map(|d| d[..4].to_string())
    }

    /// Where the transcoded output should land once post-processing is done:
    /// the reported filename with the audio extension swapped in.
    pub fn predicted_output(&self) -> Option<PathBuf> {
        self.filename
            .as_ref()
            .map(|f| PathBuf::from(f).with_extension(crate::pipeline::AUDIO_EXT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_artists_prefers_artist_field() {
        let info = RawTrackInfo {
            artist: Some(OneOrMany::One("Primary".to_string())),
            uploader: Some("Uploader".to_string()),
            ..Default::default()
        };
        assert_eq!(info.fallback_artists(), vec!["Primary"]);
    }

    #[test]
    fn test_fallback_artists_accepts_list() {
        let info = RawTrackInfo {
            artist: Some(OneOrMany::Many(vec![
                "A".to_string(),
                "".to_string(),
                "B".to_string(),
            ])),
            ..Default::default()
        };
        assert_eq!(info.fallback_artists(), vec!["A", "B"]);
    }

    #[test]
    fn test_fallback_artists_walks_the_chain() {
        let info = RawTrackInfo {
            artist: Some(OneOrMany::One(String::new())),
            uploader: None,
            uploader_id: Some("uid".to_string()),
            channel: Some("chan".to_string()),
            ..Default::default()
        };
        assert_eq!(info.fallback_artists(), vec!["uid"]);
    }

    #[test]
    fn test_fallback_artists_empty_when_nothing_set() {
        assert!(RawTrackInfo::default().fallback_artists().is_empty());
    }

    #[test]
    fn test_fallback_year_truncates_upload_date() {
        let info = RawTrackInfo {
            upload_date: Some("20240131".to_string()),
            ..Default::default()
        };
        assert_eq!(info.fallback_year().as_deref(), Some("2024"));

        let short = RawTrackInfo {
            upload_date: Some("24".to_string()),
            ..Default::default()
        };
        assert!(short.fallback_year().is_none());
    }

    #[test]
    fn test_predicted_output_swaps_extension() {
        let info = RawTrackInfo {
            filename: Some("/cache/abc123.webm".to_string()),
            ..Default::default()
        };
        assert_eq!(
            info.predicted_output(),
            Some(PathBuf::from("/cache/abc123.mp3"))
        );
    }

    #[test]
    fn test_deserialize_artist_string_or_list() {
        let single: RawTrackInfo =
            serde_json::from_str(r#"{"title": "t", "artist": "Solo"}"#).unwrap();
        assert_eq!(single.fallback_artists(), vec!["Solo"]);

        let many: RawTrackInfo =
            serde_json::from_str(r#"{"artist": ["One", "Two"]}"#).unwrap();
        assert_eq!(many.fallback_artists(), vec!["One", "Two"]);
    }
}
