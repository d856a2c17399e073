mod file_config;

pub use file_config::FileConfig;

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CACHE_DIR: &str = "audio_cache";
const DEFAULT_PORT: u16 = 2001;
const DEFAULT_DOWNLOADER_TIMEOUT_SEC: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_SEC: u64 = 300;

/// Environment variable overrides for config resolution.
///
/// Each field mirrors a [`FileConfig`] key under the upper-cased name;
/// a set variable beats the config file for that key.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub cache_dir: Option<String>,
    pub ffmpeg_location: Option<String>,
    pub port: Option<String>,
    pub provider_url: Option<String>,
    pub downloader_timeout_sec: Option<String>,
    pub sweep_interval_sec: Option<String>,
}

impl EnvOverrides {
    /// Snapshot the relevant variables from the process environment.
    pub fn from_env() -> Self {
        Self {
            cache_dir: std::env::var("CACHE_DIR").ok(),
            ffmpeg_location: std::env::var("FFMPEG_LOCATION").ok(),
            port: std::env::var("PORT").ok(),
            provider_url: std::env::var("PROVIDER_URL").ok(),
            downloader_timeout_sec: std::env::var("DOWNLOADER_TIMEOUT_SEC").ok(),
            sweep_interval_sec: std::env::var("SWEEP_INTERVAL_SEC").ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding downloaded audio files, auto-created on demand.
    pub cache_dir: PathBuf,
    /// Optional override for the ffmpeg binary handed to the external tool.
    pub ffmpeg_location: Option<PathBuf>,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Base URL of the primary metadata provider; unset disables it and
    /// metadata resolution falls straight through to the fallbacks.
    pub provider_url: Option<String>,
    /// Timeout for metadata provider requests.
    pub downloader_timeout_sec: u64,
    /// Interval between cache eviction sweeps.
    pub sweep_interval_sec: u64,
}

impl AppConfig {
    /// Resolve configuration with environment > config file > default
    /// precedence, field by field.
    pub fn resolve(env: &EnvOverrides, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let cache_dir = env
            .cache_dir
            .clone()
            .or(file.cache_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        let ffmpeg_location = env
            .ffmpeg_location
            .clone()
            .or(file.ffmpeg_location)
            .map(PathBuf::from);

        let port = match &env.port {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("PORT is not a valid port number: {:?}", raw))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let provider_url = env.provider_url.clone().or(file.provider_url);

        let downloader_timeout_sec = match &env.downloader_timeout_sec {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                anyhow::anyhow!("DOWNLOADER_TIMEOUT_SEC is not a number: {:?}", raw)
            })?,
            None => file
                .downloader_timeout_sec
                .unwrap_or(DEFAULT_DOWNLOADER_TIMEOUT_SEC),
        };

        let sweep_interval_sec = match &env.sweep_interval_sec {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("SWEEP_INTERVAL_SEC is not a number: {:?}", raw))?,
            None => file.sweep_interval_sec.unwrap_or(DEFAULT_SWEEP_INTERVAL_SEC),
        };

        Ok(Self {
            cache_dir,
            ffmpeg_location,
            port,
            provider_url,
            downloader_timeout_sec,
            sweep_interval_sec,
        })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_sec)
    }
}
