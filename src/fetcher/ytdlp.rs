//! yt-dlp driven implementation of [`AudioFetcher`].

use super::{AudioFetcher, FetchError, RawTrackInfo};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const YTDLP_BIN: &str = "yt-dlp";
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Runs yt-dlp as a subprocess, asking for best-audio MP3 extraction and a
/// single JSON info line on stdout.
pub struct YtdlpFetcher {
    /// Optional ffmpeg override passed through to the tool.
    ffmpeg_location: Option<PathBuf>,
}

impl YtdlpFetcher {
    pub fn new(ffmpeg_location: Option<PathBuf>) -> Self {
        Self { ffmpeg_location }
    }

    /// Check that the yt-dlp binary is runnable.
    pub async fn check_available() -> Result<(), FetchError> {
        let status = Command::new(YTDLP_BIN)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(FetchError::ToolFailed(format!(
                "{} --version exited with {}",
                YTDLP_BIN, status
            )));
        }
        Ok(())
    }

    fn base_command(&self, track_id: &str) -> Command {
        let mut cmd = Command::new(YTDLP_BIN);
        cmd.args(["--no-playlist", "--no-progress", "--quiet"]);
        if let Some(ffmpeg) = &self.ffmpeg_location {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }
        cmd.arg(format!("{}{}", WATCH_URL_PREFIX, track_id));
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd
    }

    async fn run(mut cmd: Command) -> Result<RawTrackInfo, FetchError> {
        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::ToolFailed(stderr.trim().to_string()));
        }

        parse_info_line(&String::from_utf8_lossy(&output.stdout))
    }
}

/// The tool prints one JSON object per processed entry; take the last line
/// that looks like one, warnings and progress noise may precede it.
fn parse_info_line(stdout: &str) -> Result<RawTrackInfo, FetchError> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| FetchError::InvalidOutput("no JSON line on stdout".to_string()))?;

    serde_json::from_str(line).map_err(|e| FetchError::InvalidOutput(e.to_string()))
}

#[async_trait]
impl AudioFetcher for YtdlpFetcher {
    async fn fetch(
        &self,
        track_id: &str,
        output_template: &Path,
    ) -> Result<RawTrackInfo, FetchError> {
        debug!("Running {} for {}", YTDLP_BIN, track_id);
        let mut cmd = self.base_command(track_id);
        cmd.args([
            "-f",
            "bestaudio/best",
            "-x",
            "--audio-format",
            crate::pipeline::AUDIO_EXT,
            "--audio-quality",
            "0",
            "--force-overwrites",
            "--print-json",
        ]);
        cmd.arg("-o").arg(output_template);
        Self::run(cmd).await
    }

    async fn probe(&self, track_id: &str) -> Result<RawTrackInfo, FetchError> {
        debug!("Probing {} metadata for {}", YTDLP_BIN, track_id);
        let mut cmd = self.base_command(track_id);
        cmd.args(["--skip-download", "--dump-json"]);
        Self::run(cmd).await
    }
}
