use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML config file, read from the path given by `--config`.
///
/// Every key has an environment variable counterpart with the upper-cased
/// name, and the environment wins (see [`super::AppConfig::resolve`]).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub cache_dir: Option<String>,
    pub ffmpeg_location: Option<String>,
    pub port: Option<u16>,
    pub provider_url: Option<String>,
    pub downloader_timeout_sec: Option<u64>,
    pub sweep_interval_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
