//! HTTP client for the primary metadata provider service.

use super::models::{SearchEntry, SongRecord};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Primary source of structured song records.
#[async_trait]
pub trait SongProvider: Send + Sync {
    /// Look up the record for one track; errors on failure or not-found.
    async fn get_song(&self, track_id: &str) -> Result<SongRecord>;

    /// Search the catalog for songs.
    async fn search(&self, query: &str) -> Result<Vec<SearchEntry>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchEntry>,
}

/// Client for a provider speaking the song-record JSON API.
pub struct HttpSongProvider {
    client: Client,
    base_url: String,
}

impl HttpSongProvider {
    /// Create a new HttpSongProvider.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the provider service
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SongProvider for HttpSongProvider {
    async fn get_song(&self, track_id: &str) -> Result<SongRecord> {
        let url = format!(
            "{}/song/{}",
            self.base_url,
            urlencoding::encode(track_id)
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Song request failed with status: {}",
                response.status()
            ));
        }

        let record = response.json().await?;
        Ok(record)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchEntry>> {
        let url = format!("{}/search", self.base_url);
        let response = self.client.get(&url).query(&[("q", query)]).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Search request failed with status: {}",
                response.status()
            ));
        }

        let search_response: SearchResponse = response.json().await?;
        Ok(search_response.results)
    }
}
