//! HTTP surface: search, download trigger, status poll and file serving.

mod search;
mod serve_file;
pub mod state;
mod track;

pub use state::ServerState;

use anyhow::Result;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::info;

/// Build the application router; exposed separately so tests can bind it to
/// an ephemeral port.
pub fn make_router(state: ServerState) -> Router {
    Router::new()
        .route("/status", get(server_status))
        .route("/search", get(search::search))
        .route("/track/{id}/download", post(track::trigger_download))
        .route("/track/{id}/status", get(track::track_status))
        .route("/track/{id}/file", get(serve_file::serve_file))
        .with_state(state)
}

async fn server_status(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "hash": state.hash,
        "uptime_sec": state.start_time.elapsed().as_secs(),
    }))
}

pub async fn run_server(state: ServerState, port: u16) -> Result<()> {
    let app = make_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Ready to serve at port {}!", port);
    axum::serve(listener, app).await?;
    Ok(())
}
