//! API Module
//!
//! HTTP handlers and routing for the node's peer-facing API.
//!
//! # Endpoints
//! - `GET /_gocache/:group/:key` - Serve a value to a peer
//! - `GET /stats` - Per-group cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
