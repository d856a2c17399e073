//! Serving cached files to the device.

use super::state::GuardedPipeline;
use axum::{
    body::Body,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::fs::File;
use tokio::io::BufReader;
use tokio_util::io::ReaderStream;
use tracing::debug;

const AUDIO_MIME: &str = "audio/mpeg";

/// Stream the canonical cache file as a binary download. Falls back to the
/// raw-identifier name for files that were fetched but never promoted.
pub async fn serve_file(
    State(pipeline): State<GuardedPipeline>,
    Path(track_id): Path<String>,
) -> Response {
    let (_, canonical) = pipeline.canonical_path(&track_id).await;

    let path = if tokio::fs::try_exists(&canonical).await.unwrap_or(false) {
        canonical
    } else {
        let fallback = pipeline
            .cache_dir()
            .join(format!("{}.{}", track_id, crate::pipeline::AUDIO_EXT));
        if !tokio::fs::try_exists(&fallback).await.unwrap_or(false) {
            return StatusCode::NOT_FOUND.into_response();
        }
        fallback
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Serving {} as {:?}", track_id, filename);

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };
    let file_length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let reader = BufReader::with_capacity(4096 * 16, file);
    let stream = ReaderStream::with_capacity(reader, 4096 * 16);
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", AUDIO_MIME)
        .header("Content-Length", file_length)
        .header(
            "Content-Disposition",
            // the canonical name is already sanitized to quote-safe characters
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(body)
        .unwrap()
}
