//! Eviction Policy Module
//!
//! Byte-budgeted stores with interchangeable eviction strategies.
//!
//! # Policies
//! - `lru`: evicts the least recently touched entry
//! - `lfu`: evicts the least referenced entry, oldest first on ties
//! - `fifo`: evicts the earliest inserted entry, reads never reorder

mod entry_list;
mod fifo;
mod lfu;
mod lru;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::cache::ByteView;
use crate::error::CacheError;

pub use fifo::FifoStore;
pub use lfu::LfuStore;
pub use lru::LruStore;

/// Callback invoked once per evicted entry, on every eviction path.
pub type OnEvicted = Box<dyn FnMut(&str, &ByteView) + Send>;

// == Cache Strategy ==
/// Capability set shared by every eviction policy.
///
/// Stores are not internally synchronized; the owner wraps them in a mutex.
pub trait CacheStrategy: Send {
    /// Looks up `key`, applying the policy's touch rule on a hit.
    ///
    /// Returns the value and the entry's last-updated instant.
    fn get(&mut self, key: &str) -> Option<(ByteView, Option<Instant>)>;

    /// Inserts or replaces `key`, then evicts until the byte budget holds.
    fn add(&mut self, key: &str, value: ByteView);

    /// Evicts every entry untouched for longer than `ttl`.
    ///
    /// Returns the number of entries removed.
    fn clean_up(&mut self, ttl: Duration) -> usize;

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of `key.len() + value.len()` over live entries.
    fn used_bytes(&self) -> usize;

    /// Byte budget, 0 = unbounded.
    fn max_bytes(&self) -> usize;
}

// == Eviction Policy ==
/// The closed set of supported eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    #[default]
    Lru,
    Lfu,
    Fifo,
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "fifo" => Ok(EvictionPolicy::Fifo),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown eviction policy '{}', expected lru, lfu or fifo",
                other
            ))),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Fifo => "fifo",
        };
        f.write_str(name)
    }
}

// == Factory ==
/// Builds the store for `policy` with a byte budget (0 = unbounded).
pub fn new_strategy(
    policy: EvictionPolicy,
    max_bytes: usize,
    on_evicted: Option<OnEvicted>,
) -> Box<dyn CacheStrategy> {
    match policy {
        EvictionPolicy::Lru => Box::new(LruStore::new(max_bytes, on_evicted)),
        EvictionPolicy::Lfu => Box::new(LfuStore::new(max_bytes, on_evicted)),
        EvictionPolicy::Fifo => Box::new(FifoStore::new(max_bytes, on_evicted)),
    }
}
