//! Track search endpoint.

use super::state::OptionalProvider;
use crate::metadata::models::SearchEntry;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

/// One row of the search listing, flattened for the front-end shell.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    pub artists: String,
    pub duration: String,
    pub album: String,
}

pub async fn search(
    State(provider): State<OptionalProvider>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = params.q.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "missing query"})),
        )
            .into_response();
    }

    let Some(provider) = provider else {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": "no metadata provider configured"})),
        )
            .into_response();
    };

    match provider.search(query).await {
        Ok(entries) => {
            let results: Vec<SearchResult> =
                entries.into_iter().filter_map(to_search_result).collect();
            Json(json!({"query": query, "results": results})).into_response()
        }
        Err(e) => {
            warn!("Search failed for {:?}: {}", query, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": format!("Search failed: {}", e)})),
            )
                .into_response()
        }
    }
}

/// Entries without an identifier are unusable downstream and dropped.
fn to_search_result(entry: SearchEntry) -> Option<SearchResult> {
    let video_id = entry.video_id.clone().filter(|id| !id.is_empty())?;
    let title = entry
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| video_id.clone());
    let artists = entry
        .artists
        .iter()
        .filter_map(|a| a.display_name())
        .collect::<Vec<_>>()
        .join(", ");
    let album = entry
        .album
        .as_ref()
        .and_then(|a| a.display_name())
        .unwrap_or_default();

    Some(SearchResult {
        video_id,
        title,
        artists,
        duration: entry.duration.unwrap_or_default(),
        album,
    })
}
