//! Cache Store Module
//!
//! Mutex-guarded eviction store owned by a single group.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::policy::{new_strategy, CacheStrategy, EvictionPolicy, OnEvicted};
use crate::cache::{ByteView, CacheStats};

struct Inner {
    strategy: Box<dyn CacheStrategy>,
    stats: CacheStats,
}

// == Cache Store ==
/// Thread-safe wrapper around one eviction strategy.
///
/// A single lock guards `get`, `add` and `clean_up`, so the three never
/// interleave. The lock is never held across an await point.
pub struct CacheStore {
    inner: Mutex<Inner>,
    evictions: Arc<AtomicU64>,
    policy: EvictionPolicy,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store for `policy` with a byte budget (0 = unbounded).
    ///
    /// `name` only labels the eviction log lines.
    pub fn new(name: &str, policy: EvictionPolicy, max_bytes: usize) -> Self {
        let evictions = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&evictions);
        let label = name.to_string();
        let on_evicted: OnEvicted = Box::new(move |key: &str, value: &ByteView| {
            counter.fetch_add(1, Ordering::Relaxed);
            debug!(group = %label, key, bytes = value.len(), "cache entry evicted");
        });

        Self {
            inner: Mutex::new(Inner {
                strategy: new_strategy(policy, max_bytes, Some(on_evicted)),
                stats: CacheStats::new(),
            }),
            evictions,
            policy,
        }
    }

    // == Get ==
    /// Looks up `key`, recording a hit or a miss.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock();
        match inner.strategy.get(key) {
            Some((value, _)) => {
                inner.stats.record_hit();
                Some(value)
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Add ==
    /// Inserts or replaces `key`, evicting as the policy dictates.
    pub fn add(&self, key: &str, value: ByteView) {
        self.inner.lock().strategy.add(key, value);
    }

    // == Clean Up ==
    /// Removes entries untouched for longer than `ttl`.
    ///
    /// Returns the number of entries removed.
    pub fn clean_up(&self, ttl: Duration) -> usize {
        self.inner.lock().strategy.clean_up(ttl)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.evictions = self.evictions.load(Ordering::Relaxed);
        stats.total_entries = inner.strategy.len();
        stats.used_bytes = inner.strategy.used_bytes();
        stats.max_bytes = inner.strategy.max_bytes();
        stats
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.inner.lock().strategy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
