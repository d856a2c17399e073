//! Download trigger and status-poll endpoints.
//!
//! Triggering runs the pipeline on a detached background task so the handler
//! returns immediately; the device's placeholder page polls the status
//! endpoint until the file lands.

use super::state::GuardedPipeline;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct TrackStatusResponse {
    pub state: &'static str,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<u64>,
}

/// Kick off a background download unless the track is already cached or one
/// is in flight. Admission control only; the lock table stays authoritative.
pub async fn trigger_download(
    State(pipeline): State<GuardedPipeline>,
    Path(track_id): Path<String>,
) -> Json<TrackStatusResponse> {
    let (_, path) = pipeline.canonical_path(&track_id).await;
    let filename = file_name_of(&path);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        info!("[{}] Already cached, not spawning", track_id);
        return Json(TrackStatusResponse {
            state: "cached",
            filename,
            size_kb: None,
        });
    }

    if pipeline.is_in_progress(&track_id) {
        info!("[{}] Already in progress, not spawning", track_id);
        return Json(TrackStatusResponse {
            state: "in_progress",
            filename,
            size_kb: None,
        });
    }

    let worker = pipeline.clone();
    let id = track_id.clone();
    tokio::spawn(async move {
        if let Err(e) = worker.download(&id).await {
            error!("[{}] Background download failed: {}", id, e);
        }
    });

    Json(TrackStatusResponse {
        state: "started",
        filename,
        size_kb: None,
    })
}

/// Report whether the canonical file exists, a download is running, or
/// neither.
pub async fn track_status(
    State(pipeline): State<GuardedPipeline>,
    Path(track_id): Path<String>,
) -> Json<TrackStatusResponse> {
    let (_, path) = pipeline.canonical_path(&track_id).await;
    let filename = file_name_of(&path);

    if let Ok(metadata) = tokio::fs::metadata(&path).await {
        return Json(TrackStatusResponse {
            state: "cached",
            filename,
            size_kb: Some(metadata.len() / 1024),
        });
    }

    let state = if pipeline.is_in_progress(&track_id) {
        "in_progress"
    } else {
        "absent"
    };
    Json(TrackStatusResponse {
        state,
        filename,
        size_kb: None,
    })
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
