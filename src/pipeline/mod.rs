//! The download-cache pipeline: canonical naming, per-track locking and the
//! fetch/promote/tag state machine.

mod filename;
mod lock_table;
mod orchestrator;

pub use filename::{make_filename, sanitize, AUDIO_EXT};
pub use lock_table::{DownloadGuard, DownloadLocks};
pub use orchestrator::{DownloadError, DownloadPipeline, PipelineSettings};
