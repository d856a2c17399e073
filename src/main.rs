use anyhow::Result;
use brano_server::config::{AppConfig, EnvOverrides, FileConfig};
use brano_server::cover::CoverTransformer;
use brano_server::fetcher::YtdlpFetcher;
use brano_server::janitor;
use brano_server::metadata::{HttpSongProvider, MetadataResolver, SongCache, SongProvider};
use brano_server::pipeline::DownloadPipeline;
use brano_server::server::{run_server, ServerState};
use brano_server::tags::TagWriter;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the TOML config file; missing file means defaults.
    /// Environment variables override file values either way.
    #[clap(long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = if cli_args.config.exists() {
        match FileConfig::load(&cli_args.config) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file {:?}: {}", cli_args.config, e);
                None
            }
        }
    } else {
        None
    };

    let config = AppConfig::resolve(&EnvOverrides::from_env(), file_config)?;
    info!("Audio cache: {:?}", config.cache_dir);

    let provider: Option<Arc<dyn SongProvider>> = match &config.provider_url {
        Some(url) => {
            info!("Metadata provider configured at {}", url);
            Some(Arc::new(HttpSongProvider::new(
                url.clone(),
                config.downloader_timeout_sec,
            )?))
        }
        None => {
            warn!("No metadata provider configured, relying on tool probes only");
            None
        }
    };

    let fetcher = Arc::new(YtdlpFetcher::new(config.ffmpeg_location.clone()));
    if let Err(e) = YtdlpFetcher::check_available().await {
        warn!("Download tool not available yet: {}", e);
    }

    let song_cache = Arc::new(SongCache::new(provider.clone()));
    let resolver = MetadataResolver::new(song_cache, fetcher.clone());
    let tag_writer = TagWriter::new(Arc::new(CoverTransformer::new()));
    let pipeline = Arc::new(DownloadPipeline::new(
        config.cache_dir.clone(),
        resolver,
        fetcher,
        tag_writer,
    ));

    janitor::spawn(
        config.cache_dir.clone(),
        janitor::CACHE_TTL,
        config.sweep_interval(),
    );

    let state = ServerState {
        pipeline,
        provider,
        start_time: Instant::now(),
        hash: env!("GIT_HASH").to_string(),
    };

    run_server(state, config.port).await
}
