//! Brano Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod cover;
pub mod fetcher;
pub mod janitor;
pub mod metadata;
pub mod pipeline;
pub mod server;
pub mod tags;

// Re-export commonly used types for convenience
pub use config::{AppConfig, EnvOverrides, FileConfig};
pub use fetcher::{AudioFetcher, YtdlpFetcher};
pub use metadata::{HttpSongProvider, MetadataResolver, SongCache, SongProvider};
pub use pipeline::{DownloadError, DownloadPipeline};
pub use server::{run_server, ServerState};
