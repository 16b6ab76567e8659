//! API Routes
//!
//! Configures the Axum router for the peer-facing endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{fetch_handler, health_handler, stats_handler, AppState};
use crate::peers::DEFAULT_BASE_PATH;

/// Creates the main router.
///
/// # Endpoints
/// - `GET /_gocache/:group/:key` - Raw value bytes for a key
/// - `GET /stats` - Per-group counters
/// - `GET /health` - Health check
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let fetch_route = format!("{}:group/:key", DEFAULT_BASE_PATH);

    Router::new()
        .route(&fetch_route, get(fetch_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
