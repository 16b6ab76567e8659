//! FIFO Store Module
//!
//! First In First Out eviction: only insertion order matters.

use std::time::{Duration, Instant};

use super::entry_list::EntryList;
use super::{CacheStrategy, OnEvicted};
use crate::cache::ByteView;

// == FIFO Store ==
/// Byte-budgeted store evicting the earliest inserted entry.
///
/// Reads never reorder. Overwriting a key keeps its original queue position
/// but refreshes the write timestamp used for TTL expiry.
pub struct FifoStore {
    queue: EntryList,
}

impl FifoStore {
    pub fn new(max_bytes: usize, on_evicted: Option<OnEvicted>) -> Self {
        Self {
            queue: EntryList::new(max_bytes, on_evicted, "fifo"),
        }
    }
}

impl CacheStrategy for FifoStore {
    fn get(&mut self, key: &str) -> Option<(ByteView, Option<Instant>)> {
        let handle = self.queue.handle(key)?;
        let entry = self.queue.entry(handle)?;
        Some((entry.value.clone(), entry.updated_at))
    }

    fn add(&mut self, key: &str, value: ByteView) {
        self.queue.upsert(key, value);
        self.queue.fit_budget();
    }

    fn clean_up(&mut self, ttl: Duration) -> usize {
        self.queue.clean_up(ttl)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn used_bytes(&self) -> usize {
        self.queue.used_bytes()
    }

    fn max_bytes(&self) -> usize {
        self.queue.max_bytes()
    }
}
