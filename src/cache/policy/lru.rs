//! LRU Store Module
//!
//! Least Recently Used eviction over an index-based linked list.

use std::time::{Duration, Instant};

use super::entry_list::EntryList;
use super::{CacheStrategy, OnEvicted};
use crate::cache::ByteView;

// == LRU Store ==
/// Byte-budgeted store evicting the least recently touched entry.
///
/// Every hit or write moves the entry to the back of the recency list and
/// refreshes its timestamp, so the front is always the eviction victim.
pub struct LruStore {
    entries: EntryList,
}

impl LruStore {
    // == Constructor ==
    /// Creates an empty store. `max_bytes == 0` means unbounded.
    pub fn new(max_bytes: usize, on_evicted: Option<OnEvicted>) -> Self {
        Self {
            entries: EntryList::new(max_bytes, on_evicted, "lru"),
        }
    }
}

impl CacheStrategy for LruStore {
    fn get(&mut self, key: &str) -> Option<(ByteView, Option<Instant>)> {
        let handle = self.entries.handle(key)?;
        self.entries.move_to_back(handle);
        let entry = self.entries.entry_mut(handle)?;
        entry.touch();
        Some((entry.value.clone(), entry.updated_at))
    }

    fn add(&mut self, key: &str, value: ByteView) {
        let handle = self.entries.upsert(key, value);
        self.entries.move_to_back(handle);
        self.entries.fit_budget();
    }

    fn clean_up(&mut self, ttl: Duration) -> usize {
        self.entries.clean_up(ttl)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn used_bytes(&self) -> usize {
        self.entries.used_bytes()
    }

    fn max_bytes(&self) -> usize {
        self.entries.max_bytes()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys_in_order(store: &LruStore) -> Vec<String> {
        store.entries.keys()
    }

    #[test]
    fn test_lru_get() {
        let mut lru = LruStore::new(0, None);
        lru.add("key1", ByteView::from("1234"));

        let (value, updated_at) = lru.get("key1").unwrap();
        assert_eq!(value.as_string(), "1234");
        assert!(updated_at.is_some());
        assert!(lru.get("key2").is_none());
    }

    #[test]
    fn test_lru_read_protects_entry() {
        // Room for exactly two entries of 4 bytes each
        let mut lru = LruStore::new(8, None);
        lru.add("k1", ByteView::from("v1"));
        lru.add("k2", ByteView::from("v2"));

        lru.get("k1");
        lru.add("k3", ByteView::from("v3"));

        assert!(lru.get("k1").is_some());
        assert!(lru.get("k2").is_none());
        assert!(lru.get("k3").is_some());
        assert_eq!(lru.used_bytes(), 8);
    }

    #[test]
    fn test_lru_remove_oldest() {
        let (k1, k2, k3) = ("key1", "key2", "k3");
        let (v1, v2, v3) = ("value1", "value2", "v3");
        let cap = k1.len() + k2.len() + v1.len() + v2.len();

        let mut lru = LruStore::new(cap, None);
        lru.add(k1, ByteView::from(v1));
        lru.add(k2, ByteView::from(v2));
        lru.add(k3, ByteView::from(v3));

        assert!(lru.get("key1").is_none());
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_update_moves_to_back() {
        let mut lru = LruStore::new(0, None);
        lru.add("a", ByteView::from("1"));
        lru.add("b", ByteView::from("1"));
        lru.add("c", ByteView::from("1"));

        lru.add("a", ByteView::from("2"));
        assert_eq!(keys_in_order(&lru), vec!["b", "c", "a"]);

        lru.get("b");
        assert_eq!(keys_in_order(&lru), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_lru_on_evicted() {
        let evicted = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = evicted.clone();
        let callback: OnEvicted = Box::new(move |key: &str, _: &ByteView| {
            sink.lock().unwrap().push(key.to_string())
        });

        let mut lru = LruStore::new(10, Some(callback));
        lru.add("key1", ByteView::from("123456"));
        lru.add("k2", ByteView::from("k2"));
        lru.add("k3", ByteView::from("k3"));
        lru.add("k4", ByteView::from("k4"));

        assert_eq!(*evicted.lock().unwrap(), vec!["key1", "k2"]);
    }
}
