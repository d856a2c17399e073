use axum::extract::FromRef;

use crate::metadata::SongProvider;
use crate::pipeline::DownloadPipeline;
use std::sync::Arc;
use std::time::Instant;

pub type GuardedPipeline = Arc<DownloadPipeline>;
pub type OptionalProvider = Option<Arc<dyn SongProvider>>;

#[derive(Clone)]
pub struct ServerState {
    pub pipeline: GuardedPipeline,
    pub provider: OptionalProvider,
    pub start_time: Instant,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedPipeline {
    fn from_ref(input: &ServerState) -> Self {
        input.pipeline.clone()
    }
}

impl FromRef<ServerState> for OptionalProvider {
    fn from_ref(input: &ServerState) -> Self {
        input.provider.clone()
    }
}
