//! Group
//!
//! A named cache namespace: local store, optional peer router, coalesced
//! loads and the origin retriever.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::Retriever;
use crate::cache::{ByteView, CacheStats, CacheStore, EvictionPolicy};
use crate::error::{CacheError, Result};
use crate::peers::{is_dot_segment, PeerRouter};
use crate::singleflight::{CallCoalescer, CallSource};

// == Group ==
pub struct Group {
    name: String,
    cache: Arc<CacheStore>,
    retriever: Arc<dyn Retriever>,
    router: OnceLock<Arc<dyn PeerRouter>>,
    flight: CallCoalescer<ByteView>,
}

impl Group {
    pub(crate) fn new(
        name: &str,
        policy: EvictionPolicy,
        max_bytes: usize,
        retriever: Arc<dyn Retriever>,
        flight_ttl: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            cache: Arc::new(CacheStore::new(name, policy, max_bytes)),
            retriever,
            router: OnceLock::new(),
            flight: CallCoalescer::new(flight_ttl),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Register Router ==
    /// Attaches the peer router. Without one every miss goes to the origin.
    ///
    /// # Panics
    /// If a router is already registered.
    pub fn register_router(&self, router: Arc<dyn PeerRouter>) {
        if self.router.set(router).is_err() {
            panic!("router already registered for group '{}'", self.name);
        }
    }

    // == Get ==
    /// Returns the value for `key`.
    ///
    /// Order: local store, then one coalesced load per key that tries the
    /// owning peer and falls back to the origin. A key the origin reports
    /// missing is cached as an empty value.
    ///
    /// A value replayed from the coalescer after the store dropped it is
    /// written back; the lookup still counts as a store miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("key is required".to_string()));
        }
        // Peers could not route these, so no node serves them
        if is_dot_segment(key) {
            return Err(CacheError::InvalidRequest(format!(
                "key '{}' is reserved",
                key
            )));
        }

        if let Some(value) = self.cache.get(key) {
            debug!(group = %self.name, key, "cache hit");
            return Ok(value);
        }

        let load = Load {
            group: self.name.clone(),
            key: key.to_string(),
            cache: Arc::clone(&self.cache),
            retriever: Arc::clone(&self.retriever),
            router: self.router.get().cloned(),
        };
        let (value, source) = self.flight.do_call_with_source(key, load.run()).await?;
        if source == CallSource::Replayed {
            debug!(group = %self.name, key, "restoring replayed value");
            self.cache.add(key, value.clone());
        }
        Ok(value)
    }

    /// Sweeps store entries idle for longer than `ttl`.
    pub fn clean_up(&self, ttl: Duration) -> usize {
        self.cache.clean_up(ttl)
    }

    /// Drops expired coalescer results.
    pub fn purge_flight(&self) -> usize {
        self.flight.purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.cache.policy()
    }
}

/// Everything one miss needs, owned so the load can outlive its caller.
struct Load {
    group: String,
    key: String,
    cache: Arc<CacheStore>,
    retriever: Arc<dyn Retriever>,
    router: Option<Arc<dyn PeerRouter>>,
}

impl Load {
    async fn run(self) -> Result<ByteView> {
        if let Some(fetcher) = self.router.as_ref().and_then(|r| r.pick(&self.key)) {
            match fetcher.fetch(&self.group, &self.key).await {
                Ok(bytes) => {
                    let value = ByteView::from(bytes);
                    debug!(group = %self.group, key = %self.key, "loaded from peer");
                    self.cache.add(&self.key, value.clone());
                    return Ok(value);
                }
                Err(e) => {
                    warn!(group = %self.group, key = %self.key, error = %e, "peer fetch failed, using origin");
                }
            }
        }

        let value = match self.retriever.retrieve(&self.key).await {
            Ok(bytes) => ByteView::from(bytes),
            Err(e) if e.is_not_found() => {
                warn!(group = %self.group, key = %self.key, "origin has no such key, caching empty value");
                ByteView::empty()
            }
            Err(e) => return Err(e),
        };

        self.cache.add(&self.key, value.clone());
        info!(group = %self.group, key = %self.key, bytes = value.len(), "populated from origin");
        Ok(value)
    }
}
