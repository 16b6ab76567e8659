//! API Handlers
//!
//! Endpoints other nodes and operators call on this node.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::models::{GroupStatsResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: GroupRegistry,
    /// This node's advertised address
    pub node: String,
}

impl AppState {
    pub fn new(registry: GroupRegistry, node: impl Into<String>) -> Self {
        Self {
            registry,
            node: node.into(),
        }
    }
}

/// Handler for GET /_gocache/:group/:key
///
/// Serves the raw value bytes. Peers call this when they route a key here.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let group = state
        .registry
        .get_group(&group)
        .ok_or(CacheError::GroupNotFound(group))?;

    let value = group.get(&key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        value.byte_slice(),
    ))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let groups = state
        .registry
        .groups()
        .iter()
        .map(|group| GroupStatsResponse::from(group.as_ref()))
        .collect();

    Json(StatsResponse {
        node: state.node.clone(),
        groups,
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.node))
}
