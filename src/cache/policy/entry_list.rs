//! Entry List Module
//!
//! Byte accounting, eviction and TTL sweep over an ordered entry list.
//! LRU and FIFO share all of it and differ only in when they reorder.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

use super::OnEvicted;
use crate::cache::list::{Handle, OrderList};
use crate::cache::{ByteView, CacheEntry};

/// Keyed entries in eviction order, front first.
pub(super) struct EntryList {
    max_bytes: usize,
    used_bytes: usize,
    order: OrderList<CacheEntry>,
    index: HashMap<String, Handle>,
    on_evicted: Option<OnEvicted>,
    label: &'static str,
}

impl EntryList {
    /// `label` only tags trace output.
    pub(super) fn new(max_bytes: usize, on_evicted: Option<OnEvicted>, label: &'static str) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            order: OrderList::new(),
            index: HashMap::new(),
            on_evicted,
            label,
        }
    }

    pub(super) fn handle(&self, key: &str) -> Option<Handle> {
        self.index.get(key).copied()
    }

    pub(super) fn entry(&self, handle: Handle) -> Option<&CacheEntry> {
        self.order.get(handle)
    }

    pub(super) fn entry_mut(&mut self, handle: Handle) -> Option<&mut CacheEntry> {
        self.order.get_mut(handle)
    }

    pub(super) fn move_to_back(&mut self, handle: Handle) {
        self.order.move_to_back(handle);
    }

    // == Upsert ==
    /// Replaces the value of an existing key in place, refreshing its
    /// timestamp, or appends a new entry at the back. Does not evict.
    pub(super) fn upsert(&mut self, key: &str, value: ByteView) -> Handle {
        if let Some(handle) = self.handle(key) {
            if let Some(entry) = self.order.get_mut(handle) {
                entry.touch();
                self.used_bytes = self.used_bytes - entry.value.len() + value.len();
                entry.value = value;
            }
            return handle;
        }

        let entry = CacheEntry::new(key, value);
        self.used_bytes += entry.size();
        let handle = self.order.push_back(entry);
        self.index.insert(key.to_string(), handle);
        handle
    }

    // == Evict ==
    /// Removes one entry and reports it to the eviction callback.
    pub(super) fn evict(&mut self, handle: Handle) {
        if let Some(entry) = self.order.remove(handle) {
            self.index.remove(&entry.key);
            self.used_bytes -= entry.size();
            trace!(policy = self.label, key = %entry.key, "evicted");
            if let Some(callback) = self.on_evicted.as_mut() {
                callback(&entry.key, &entry.value);
            }
        }
    }

    /// Evicts from the front until the byte budget holds.
    pub(super) fn fit_budget(&mut self) {
        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            match self.order.front() {
                Some(front) => self.evict(front),
                None => break,
            }
        }
    }

    // == Clean Up ==
    /// Evicts every entry idle for longer than `ttl`.
    ///
    /// Scans the whole list: touches and in-place overwrites mean list
    /// order does not follow timestamps.
    pub(super) fn clean_up(&mut self, ttl: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<Handle> = self
            .order
            .handles()
            .into_iter()
            .filter(|&h| {
                self.order
                    .get(h)
                    .is_some_and(|entry| entry.is_expired_at(ttl, now))
            })
            .collect();

        for &handle in &expired {
            self.evict(handle);
        }
        expired.len()
    }

    /// Keys from front to back.
    #[cfg(test)]
    pub(super) fn keys(&self) -> Vec<String> {
        self.order
            .handles()
            .into_iter()
            .filter_map(|h| self.order.get(h).map(|entry| entry.key.clone()))
            .collect()
    }

    pub(super) fn len(&self) -> usize {
        self.order.len()
    }

    pub(super) fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub(super) fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_upsert_keeps_position_and_accounts_bytes() {
        let mut list = EntryList::new(0, None, "test");
        let first = list.upsert("a", ByteView::from("1"));
        list.upsert("b", ByteView::from("22"));

        assert_eq!(list.upsert("a", ByteView::from("333")), first);
        assert_eq!(list.keys(), vec!["a", "b"]);
        assert_eq!(list.used_bytes(), 1 + 3 + 1 + 2);
    }

    #[test]
    fn test_fit_budget_evicts_from_front() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let callback: OnEvicted = Box::new(move |key: &str, _: &ByteView| {
            sink.lock().unwrap().push(key.to_string())
        });

        let mut list = EntryList::new(4, Some(callback), "test");
        list.upsert("k1", ByteView::from("v1"));
        list.upsert("k2", ByteView::from("v2"));
        list.fit_budget();

        assert_eq!(list.keys(), vec!["k2"]);
        assert_eq!(*evicted.lock().unwrap(), vec!["k1".to_string()]);
        assert_eq!(list.used_bytes(), 4);
    }

    #[test]
    fn test_clean_up_ignores_unrepresentable_ttl() {
        let mut list = EntryList::new(0, None, "test");
        list.upsert("k", ByteView::from("v"));

        assert_eq!(list.clean_up(Duration::MAX), 0);
        assert_eq!(list.len(), 1);
    }
}
