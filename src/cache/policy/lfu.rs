//! LFU Store Module
//!
//! Least Frequently Used eviction over an indexed binary min-heap.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

use super::{CacheStrategy, OnEvicted};
use crate::cache::{ByteView, CacheEntry};

#[derive(Debug)]
struct LfuEntry {
    entry: CacheEntry,
    /// Reference count, bumped on every hit and write
    count: u64,
    /// Touch sequence, orders like `updated_at` without clock ties
    seq: u64,
}

impl LfuEntry {
    fn rank(&self) -> (u64, u64) {
        (self.count, self.seq)
    }
}

// == LFU Store ==
/// Byte-budgeted store evicting the entry with the lowest reference count.
///
/// Ties on count go to the entry touched longest ago. The heap root is
/// always the next victim; `index` maps each key to its heap slot.
pub struct LfuStore {
    max_bytes: usize,
    used_bytes: usize,
    heap: Vec<LfuEntry>,
    index: HashMap<String, usize>,
    tick: u64,
    on_evicted: Option<OnEvicted>,
}

impl LfuStore {
    pub fn new(max_bytes: usize, on_evicted: Option<OnEvicted>) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            heap: Vec::new(),
            index: HashMap::new(),
            tick: 0,
            on_evicted,
        }
    }

    /// Bumps the reference count and recency of the entry at `pos`.
    fn reference(&mut self, pos: usize) {
        self.tick += 1;
        let node = &mut self.heap[pos];
        node.count += 1;
        node.seq = self.tick;
        node.entry.touch();
        self.fix(pos);
    }

    fn evict_at(&mut self, pos: usize) {
        let last = self.heap.len() - 1;
        self.swap(pos, last);
        let Some(node) = self.heap.pop() else {
            return;
        };
        if pos < self.heap.len() {
            self.fix(pos);
        }

        self.index.remove(&node.entry.key);
        self.used_bytes -= node.entry.size();
        trace!(key = %node.entry.key, count = node.count, "lfu evicted");
        if let Some(callback) = self.on_evicted.as_mut() {
            callback(&node.entry.key, &node.entry.value);
        }
    }

    // == Heap Maintenance ==
    fn fix(&mut self, pos: usize) {
        let pos = self.sift_up(pos);
        self.sift_down(pos);
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].rank() >= self.heap[parent].rank() {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.heap[left].rank() < self.heap[smallest].rank() {
                smallest = left;
            }
            if right < len && self.heap[right].rank() < self.heap[smallest].rank() {
                smallest = right;
            }
            if smallest == pos {
                return;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.index.insert(self.heap[a].entry.key.clone(), a);
        self.index.insert(self.heap[b].entry.key.clone(), b);
    }
}

impl CacheStrategy for LfuStore {
    fn get(&mut self, key: &str) -> Option<(ByteView, Option<Instant>)> {
        let pos = *self.index.get(key)?;
        self.reference(pos);

        // The entry may have moved during re-heapify
        let pos = *self.index.get(key)?;
        let entry = &self.heap[pos].entry;
        Some((entry.value.clone(), entry.updated_at))
    }

    fn add(&mut self, key: &str, value: ByteView) {
        if let Some(&pos) = self.index.get(key) {
            let entry = &mut self.heap[pos].entry;
            self.used_bytes = self.used_bytes - entry.value.len() + value.len();
            entry.value = value;
            self.reference(pos);
        } else {
            let entry = CacheEntry::new(key, value);
            self.used_bytes += entry.size();
            let pos = self.heap.len();
            self.heap.push(LfuEntry {
                entry,
                count: 0,
                seq: 0,
            });
            self.index.insert(key.to_string(), pos);
            self.reference(pos);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes && !self.heap.is_empty() {
            self.evict_at(0);
        }
    }

    fn clean_up(&mut self, ttl: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .heap
            .iter()
            .filter(|node| node.entry.is_expired_at(ttl, now))
            .map(|node| node.entry.key.clone())
            .collect();

        for key in &expired {
            if let Some(&pos) = self.index.get(key) {
                self.evict_at(pos);
            }
        }
        expired.len()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_heap_consistent(store: &LfuStore) {
        for (pos, node) in store.heap.iter().enumerate() {
            assert_eq!(store.index[&node.entry.key], pos);
            if pos > 0 {
                assert!(store.heap[(pos - 1) / 2].rank() <= node.rank());
            }
        }
        assert_eq!(store.index.len(), store.heap.len());
    }

    #[test]
    fn test_lfu_get() {
        let mut lfu = LfuStore::new(10, None);
        lfu.add("k1", ByteView::from("1234"));

        let (value, _) = lfu.get("k1").unwrap();
        assert_eq!(value.as_string(), "1234");
        assert!(lfu.get("key2").is_none());
    }

    #[test]
    fn test_lfu_evicts_least_referenced() {
        // Room for exactly two entries of 4 bytes each
        let mut lfu = LfuStore::new(8, None);
        lfu.add("k1", ByteView::from("v1"));
        lfu.get("k1");
        lfu.get("k1");
        lfu.get("k1");
        lfu.add("k2", ByteView::from("v2"));

        lfu.add("k3", ByteView::from("v3"));

        assert!(lfu.get("k2").is_none());
        assert!(lfu.get("k1").is_some());
        assert!(lfu.get("k3").is_some());
        assert_heap_consistent(&lfu);
    }

    #[test]
    fn test_lfu_tie_breaks_on_oldest() {
        let mut lfu = LfuStore::new(8, None);
        lfu.add("k1", ByteView::from("v1"));
        lfu.add("k2", ByteView::from("v2"));
        lfu.add("k3", ByteView::from("v3"));

        // All counts are 1, k1 was touched first
        assert!(lfu.get("k1").is_none());
        assert_eq!(lfu.len(), 2);
    }

    #[test]
    fn test_lfu_remove() {
        let (k1, k2, k3) = ("key1", "key2", "k3");
        let (v1, v2, v3) = ("value1", "value2", "v3");
        let cap = k1.len() + k2.len() + v1.len() + v2.len();

        let mut lfu = LfuStore::new(cap, None);
        lfu.add(k1, ByteView::from(v1));
        lfu.add(k1, ByteView::from(v1));
        lfu.add(k2, ByteView::from(v2));
        lfu.add(k3, ByteView::from(v3));

        assert!(lfu.get("key2").is_none());
        assert_eq!(lfu.len(), 2);
    }

    #[test]
    fn test_lfu_heap_stays_consistent() {
        let mut lfu = LfuStore::new(60, None);
        for round in 0..5 {
            for i in 0..12 {
                let key = format!("key{}", (i * 7 + round) % 13);
                if i % 3 == 0 {
                    lfu.get(&key);
                } else {
                    lfu.add(&key, ByteView::from("val"));
                }
                assert_heap_consistent(&lfu);
                assert!(lfu.used_bytes() <= 60);
            }
        }
    }
}
