//! Hash Ring Module
//!
//! Consistent hashing with virtual nodes for key-to-peer assignment.

use std::collections::HashMap;

use tracing::trace;

/// Maps bytes onto the 32-bit ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Default virtual nodes per peer.
pub const DEFAULT_REPLICAS: usize = 50;

// == Hash Ring ==
/// Consistent hash ring.
///
/// Each peer owns `replicas` positions, position `i` being
/// `hash(i ++ peer)`. A key belongs to the first position at or after
/// `hash(key)`, wrapping past the largest position back to the smallest.
#[derive(Debug, Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual positions, duplicates allowed
    ring: Vec<u32>,
    /// Virtual position to owning peer
    owners: HashMap<u32, String>,
    /// Peer to the positions inserted for it, one per insertion
    positions: HashMap<String, Vec<u32>>,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring. `hash` defaults to CRC-32 (IEEE).
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(crc32fast::hash),
            replicas,
            ring: Vec::new(),
            owners: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    // == Add Peers ==
    /// Inserts `replicas` virtual positions for every peer.
    ///
    /// Re-adding a peer duplicates its positions; a later `remove` still
    /// clears all of them.
    pub fn add_peers<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            let slots = self.positions.entry(peer.to_string()).or_default();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{}{}", i, peer).as_bytes());
                self.ring.push(position);
                self.owners.insert(position, peer.to_string());
                slots.push(position);
            }
        }
        self.ring.sort_unstable();
    }

    // == Get ==
    /// Returns the peer owning `key`, or `None` when the ring is empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.ring.partition_point(|&p| p < hash) % self.ring.len();
        let owner = self.owners.get(&self.ring[idx]).map(String::as_str);
        trace!(key, hash, idx, ?owner, "ring lookup");
        owner
    }

    // == Remove ==
    /// Removes every virtual position inserted for `peer`.
    ///
    /// Uses the positions recorded at insertion time, so only the exact
    /// slots added for this peer are dropped. A position shared with another
    /// peer through a hash collision is handed back to that peer.
    pub fn remove(&mut self, peer: &str) {
        let Some(slots) = self.positions.remove(peer) else {
            return;
        };

        for position in slots {
            if let Ok(idx) = self.ring.binary_search(&position) {
                self.ring.remove(idx);
            }

            if self.owners.get(&position).is_some_and(|owner| owner == peer) {
                self.owners.remove(&position);
                let survivor = self
                    .positions
                    .iter()
                    .find(|(_, slots)| slots.contains(&position))
                    .map(|(other, _)| other.clone());
                if let Some(other) = survivor {
                    self.owners.insert(position, other);
                }
            }
        }
    }

    /// Returns true when no peer is on the ring.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of virtual positions on the ring.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Distinct peers currently on the ring.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.positions.keys().cloned().collect();
        peers.sort();
        peers
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS, None)
    }
}
