//! Response models for the peer-facing API

pub mod responses;

pub use responses::{GroupStatsResponse, HealthResponse, StatsResponse};
