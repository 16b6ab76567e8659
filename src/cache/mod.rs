//! Cache Module
//!
//! Byte-budgeted in-memory storage with pluggable eviction and TTL sweep.

mod byteview;
mod entry;
mod list;
pub mod policy;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use entry::CacheEntry;
pub use policy::{new_strategy, CacheStrategy, EvictionPolicy, OnEvicted};
pub use stats::CacheStats;
pub use store::CacheStore;
