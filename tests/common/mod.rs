//! Common test infrastructure
//!
//! Spawns an isolated server per test: a temp cache directory, a canned
//! metadata provider and a scripted stand-in for the external
//! fetch-and-transcode tool. Tests drive everything over HTTP.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use brano_server::cover::CoverTransformer;
use brano_server::fetcher::{AudioFetcher, FetchError, RawTrackInfo};
use brano_server::metadata::models::SearchEntry;
use brano_server::metadata::{MetadataResolver, SongCache, SongProvider, SongRecord};
use brano_server::pipeline::{DownloadPipeline, PipelineSettings};
use brano_server::server::{make_router, ServerState};
use brano_server::tags::TagWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Canned primary provider: one song record for every id, plus fixed search
/// results. `None` record means every lookup fails.
pub struct StaticProvider {
    record: Option<SongRecord>,
    search_results: Vec<SearchEntry>,
}

#[async_trait]
impl SongProvider for StaticProvider {
    async fn get_song(&self, _track_id: &str) -> Result<SongRecord> {
        self.record.clone().ok_or_else(|| anyhow!("provider down"))
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchEntry>> {
        Ok(self.search_results.clone())
    }
}

/// Scripted external tool: writes `{id}.mp3` into the output directory after
/// an optional delay and counts invocations.
pub struct ScriptedFetcher {
    pub fetches: AtomicUsize,
    pub write_output: bool,
    pub delay: Duration,
    pub info: RawTrackInfo,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            write_output: true,
            delay: Duration::ZERO,
            info: RawTrackInfo::default(),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        track_id: &str,
        output_template: &Path,
    ) -> Result<RawTrackInfo, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        if self.write_output {
            let dir = output_template.parent().unwrap();
            std::fs::write(dir.join(format!("{}.mp3", track_id)), b"fake mp3 bytes").unwrap();
        }
        Ok(self.info.clone())
    }

    async fn probe(&self, _track_id: &str) -> Result<RawTrackInfo, FetchError> {
        Ok(self.info.clone())
    }
}

/// Test server instance on an ephemeral port with its own cache directory.
pub struct TestServer {
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub fetcher: Arc<ScriptedFetcher>,
    _temp_cache_dir: TempDir,
}

impl TestServer {
    /// Spawn with the standard fixture: a provider that knows one song and
    /// a tool that produces output immediately.
    pub async fn spawn() -> Self {
        Self::spawn_with(Some(default_record()), Arc::new(ScriptedFetcher::new())).await
    }

    pub async fn spawn_with(record: Option<SongRecord>, fetcher: Arc<ScriptedFetcher>) -> Self {
        let temp_cache_dir = TempDir::new().expect("Failed to create temp cache dir");
        let cache_dir = temp_cache_dir.path().to_path_buf();

        let provider: Arc<dyn SongProvider> = Arc::new(StaticProvider {
            record,
            search_results: default_search_results(),
        });
        let song_cache = Arc::new(SongCache::new(Some(provider.clone())));
        let resolver = MetadataResolver::new(song_cache, fetcher.clone());
        let pipeline = Arc::new(DownloadPipeline::with_settings(
            cache_dir.clone(),
            resolver,
            fetcher.clone(),
            TagWriter::new(Arc::new(CoverTransformer::new())),
            PipelineSettings {
                lock_wait: Duration::from_secs(5),
                poll_attempts: 5,
                poll_interval: Duration::from_millis(10),
            },
        ));

        let state = ServerState {
            pipeline,
            provider: Some(provider),
            start_time: Instant::now(),
            hash: "test".to_string(),
        };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test port");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, make_router(state)).await.unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            cache_dir,
            fetcher,
            _temp_cache_dir: temp_cache_dir,
        }
    }
}

/// HTTP client wrapping the server's endpoints.
pub struct TestClient {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build reqwest client");
        Self { client, base_url }
    }

    pub async fn server_status(&self) -> reqwest::Response {
        self.client
            .get(format!("{}/status", self.base_url))
            .send()
            .await
            .expect("status request failed")
    }

    pub async fn search(&self, query: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .expect("search request failed")
    }

    pub async fn trigger_download(&self, track_id: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/track/{}/download", self.base_url, track_id))
            .send()
            .await
            .expect("download request failed")
    }

    pub async fn track_status(&self, track_id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/track/{}/status", self.base_url, track_id))
            .send()
            .await
            .expect("track status request failed")
    }

    pub async fn fetch_file(&self, track_id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/track/{}/file", self.base_url, track_id))
            .send()
            .await
            .expect("file request failed")
    }

    /// Poll the status endpoint until the track reports cached.
    pub async fn wait_until_cached(&self, track_id: &str) -> serde_json::Value {
        for _ in 0..100 {
            let status: serde_json::Value = self
                .track_status(track_id)
                .await
                .json()
                .await
                .expect("status body");
            if status["state"] == "cached" {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("track {} never became cached", track_id);
    }
}

pub fn default_record() -> SongRecord {
    serde_json::from_str(r#"{"title": "Song", "artists": [{"name": "Artist"}]}"#).unwrap()
}

fn default_search_results() -> Vec<SearchEntry> {
    serde_json::from_str(
        r#"[
            {"videoId": "abc123", "title": "Song", "artists": [{"name": "Artist"}],
             "duration": "3:21", "album": {"name": "The Album"}},
            {"title": "dropped, no id"}
        ]"#,
    )
    .unwrap()
}
