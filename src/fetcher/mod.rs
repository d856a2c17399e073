//! External fetch-and-transcode collaborator.
//!
//! The tool that actually retrieves remote audio and converts it to MP3 lives
//! outside this process. This module defines the seam ([`AudioFetcher`]) and
//! the production implementation that shells out to yt-dlp.

mod models;
mod ytdlp;

pub use models::{OneOrMany, RawTrackInfo};
pub use ytdlp::YtdlpFetcher;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors reported by the external tool.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("external tool failed to launch: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("external tool exited with an error: {0}")]
    ToolFailed(String),

    #[error("could not parse tool output: {0}")]
    InvalidOutput(String),
}

/// Seam over the external download/transcode tool.
///
/// `fetch` downloads a track as MP3 under the given output template and
/// returns whatever structured info the tool reports; `probe` returns the same
/// info without downloading anything. Neither guarantees a usable partial file
/// on failure.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, track_id: &str, output_template: &Path)
        -> Result<RawTrackInfo, FetchError>;

    async fn probe(&self, track_id: &str) -> Result<RawTrackInfo, FetchError>;
}
