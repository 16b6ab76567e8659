//! Peercache - A peer-to-peer read-through cache node
//!
//! Keys are partitioned across nodes with a consistent hash ring. A miss is
//! served by the owning peer or, failing that, by the origin, with
//! concurrent misses for one key collapsed into a single load.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;
pub mod singleflight;
pub mod tasks;

pub use api::AppState;
pub use cache::{ByteView, EvictionPolicy};
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Group, GroupRegistry, RetrieveFn, Retriever, StaticRetriever};
pub use peers::{HashRing, HttpPool, PeerRouter, RemoteFetcher};
pub use tasks::{spawn_cleanup_task, spawn_flight_sweeper};
