//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::EvictionPolicy;
use crate::error::Result;

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Eviction policy name for every group (lru, lfu, fifo)
    pub cache_policy: String,
    /// Byte budget per group store, 0 = unbounded
    pub cache_max_bytes: usize,
    /// Idle time in seconds after which the sweep removes an entry
    pub cache_ttl: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Lifetime in seconds of a coalesced result
    pub flight_ttl: u64,
    /// Virtual nodes per peer on the hash ring
    pub ring_replicas: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Address peers use to reach this node
    pub self_addr: String,
    /// Every node in the cluster, this one included
    pub peers: Vec<String>,
    /// Groups created at startup
    pub groups: Vec<String>,
    /// Peer request timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// JSON object served as the origin, if set
    pub origin_file: Option<String>,
}

fn parsed<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_POLICY` - Eviction policy (default: lru)
    /// - `CACHE_MAX_BYTES` - Byte budget per group (default: 4000)
    /// - `CACHE_TTL` - Idle TTL in seconds (default: 30)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `FLIGHT_TTL` - Coalesced result lifetime in seconds (default: 10)
    /// - `RING_REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `SERVER_PORT` - HTTP server port (default: 9999)
    /// - `SELF_ADDR` - This node's URL (default: http://127.0.0.1:9999)
    /// - `PEERS` - Comma-separated peer URLs (default: self only)
    /// - `GROUPS` - Comma-separated group names (default: scores)
    /// - `FETCH_TIMEOUT_MS` - Peer request timeout (default: 2000)
    /// - `ORIGIN_FILE` - Path to a JSON origin (default: built-in demo data)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let self_addr = env::var("SELF_ADDR")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.self_addr);

        let mut peers = env::var("PEERS")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        if peers.is_empty() {
            peers.push(self_addr.clone());
        }

        let groups = env::var("GROUPS")
            .map(|v| split_list(&v))
            .ok()
            .filter(|g| !g.is_empty())
            .unwrap_or(defaults.groups);

        Self {
            cache_policy: env::var("CACHE_POLICY").unwrap_or(defaults.cache_policy),
            cache_max_bytes: parsed("CACHE_MAX_BYTES", defaults.cache_max_bytes),
            cache_ttl: parsed("CACHE_TTL", defaults.cache_ttl),
            cleanup_interval: parsed("CLEANUP_INTERVAL", defaults.cleanup_interval),
            flight_ttl: parsed("FLIGHT_TTL", defaults.flight_ttl),
            ring_replicas: parsed("RING_REPLICAS", defaults.ring_replicas),
            server_port: parsed("SERVER_PORT", defaults.server_port),
            self_addr,
            peers,
            groups,
            fetch_timeout_ms: parsed("FETCH_TIMEOUT_MS", defaults.fetch_timeout_ms),
            origin_file: env::var("ORIGIN_FILE").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Parses `cache_policy`.
    pub fn policy(&self) -> Result<EvictionPolicy> {
        self.cache_policy.parse()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }

    pub fn flight_ttl(&self) -> Duration {
        Duration::from_secs(self.flight_ttl)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let self_addr = "http://127.0.0.1:9999".to_string();
        Self {
            cache_policy: "lru".to_string(),
            cache_max_bytes: 4000,
            cache_ttl: 30,
            cleanup_interval: 60,
            flight_ttl: 10,
            ring_replicas: 50,
            server_port: 9999,
            peers: vec![self_addr.clone()],
            self_addr,
            groups: vec!["scores".to_string()],
            fetch_timeout_ms: 2000,
            origin_file: None,
        }
    }
}
