//! Response DTOs for the peer-facing API
//!
//! Values themselves travel as raw bytes; these bodies are the JSON
//! side endpoints.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::group::Group;

/// Per-group counters (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatsResponse {
    pub name: String,
    pub policy: String,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    pub used_bytes: usize,
    /// 0 means unbounded
    pub max_bytes: usize,
    pub hit_rate: f64,
}

impl GroupStatsResponse {
    pub fn new(name: impl Into<String>, policy: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            name: name.into(),
            policy: policy.into(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            used_bytes: stats.used_bytes,
            max_bytes: stats.max_bytes,
            hit_rate: stats.hit_rate(),
        }
    }
}

impl From<&Group> for GroupStatsResponse {
    fn from(group: &Group) -> Self {
        Self::new(group.name(), group.policy().to_string(), &group.stats())
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub node: String,
    pub groups: Vec<GroupStatsResponse>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    pub node: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(node: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            node: node.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
