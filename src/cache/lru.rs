//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch stamps the key with a fresh, strictly increasing sequence
/// number. The ordered `order` map therefore reads:
/// - Front (lowest sequence) = Least recently used
/// - Back (highest sequence) = Most recently used
///
/// Touch, remove and eviction are all O(log n).
#[derive(Debug)]
pub struct LruTracker<K> {
    /// Sequence number -> key, in access order
    order: BTreeMap<u64, K>,
    /// Key -> its current sequence number
    positions: HashMap<K, u64>,
    /// Next sequence number to hand out
    next_seq: u64,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self {
            order: BTreeMap::new(),
            positions: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Clone + Eq + Hash> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used (moves to back).
    ///
    /// If key exists, its old position is dropped first, so a key is tracked
    /// at most once.
    pub fn touch(&mut self, key: &K) {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(old) = self.positions.insert(key.clone(), seq) {
            self.order.remove(&old);
        }
        self.order.insert(seq, key.clone());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &K) {
        if let Some(seq) = self.positions.remove(key) {
            self.order.remove(&seq);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.positions.remove(&key);
        Some(key)
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }
}
