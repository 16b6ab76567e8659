//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use crate::cache::ByteView;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The entry key
    pub key: String,
    /// The stored value
    pub value: ByteView,
    /// Last write or touch, None = never touched (never expires)
    pub updated_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry, stamped with the current time.
    pub fn new(key: impl Into<String>, value: ByteView) -> Self {
        let mut entry = Self {
            key: key.into(),
            value,
            updated_at: None,
        };
        entry.touch();
        entry
    }

    // == Touch ==
    /// Refreshes the last-updated timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Some(Instant::now());
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl`.
    ///
    /// An entry is expired once `updated_at + ttl` lies strictly in the past.
    /// Entries that were never stamped do not expire, nor do entries whose
    /// deadline falls beyond what `Instant` can represent.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.is_expired_at(ttl, Instant::now())
    }

    pub(crate) fn is_expired_at(&self, ttl: Duration, now: Instant) -> bool {
        match self.updated_at {
            Some(updated) => updated
                .checked_add(ttl)
                .is_some_and(|deadline| deadline < now),
            None => false,
        }
    }

    // == Size ==
    /// Bytes charged against the store budget: key plus value length.
    pub fn size(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation_is_stamped() {
        let entry = CacheEntry::new("key", ByteView::from("value"));

        assert_eq!(entry.key, "key");
        assert!(entry.updated_at.is_some());
        assert_eq!(entry.size(), 8);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("key", ByteView::from("value"));
        assert!(!entry.is_expired(Duration::from_secs(60)));

        sleep(Duration::from_millis(20));

        assert!(entry.is_expired(Duration::from_millis(5)));
        assert!(!entry.is_expired(Duration::from_secs(60)));
    }

    #[test]
    fn test_unstamped_entry_never_expires() {
        let entry = CacheEntry {
            key: "key".to_string(),
            value: ByteView::empty(),
            updated_at: None,
        };

        assert!(!entry.is_expired(Duration::ZERO));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry {
            key: "k".to_string(),
            value: ByteView::empty(),
            updated_at: Some(now),
        };

        // Exactly at updated_at + ttl is not yet expired
        assert!(!entry.is_expired_at(Duration::ZERO, now));
        assert!(entry.is_expired_at(Duration::ZERO, now + Duration::from_millis(1)));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let entry = CacheEntry::new("key", ByteView::from("value"));
        let later = Instant::now() + Duration::from_secs(3600);

        assert!(!entry.is_expired(Duration::MAX));
        assert!(!entry.is_expired_at(Duration::from_secs(u64::MAX), later));
    }

    #[test]
    fn test_touch_refreshes_timestamp() {
        let mut entry = CacheEntry::new("key", ByteView::empty());
        let first = entry.updated_at;

        sleep(Duration::from_millis(5));
        entry.touch();

        assert!(entry.updated_at > first);
    }
}
