//! Eviction Store Module
//!
//! Capacity-bounded entry storage combining a HashMap with LRU tracking and
//! lazily checked TTL expiration.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, LruTracker};

// == Eviction Store ==
/// Entry storage with LRU eviction and TTL metadata.
///
/// Expiry is never enforced in the background: stale entries stay in memory
/// until they are overwritten, evicted, removed, or purged explicitly.
#[derive(Debug)]
pub struct EvictionStore<T> {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry<T>>,
    /// LRU access tracker
    lru: LruTracker<CacheKey>,
    /// Maximum number of entries allowed
    max_cache: usize,
    /// Time-to-live in milliseconds
    cache_time_ms: u64,
}

impl<T> EvictionStore<T> {
    // == Constructor ==
    /// Creates a new EvictionStore with specified capacity and TTL.
    ///
    /// # Arguments
    /// * `max_cache` - Maximum number of entries the store can hold
    /// * `cache_time_ms` - Time-to-live in milliseconds
    pub fn new(max_cache: usize, cache_time_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_cache,
            cache_time_ms,
        }
    }

    // == Has ==
    /// True iff the key is present, fresh or not.
    pub fn has(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    // == Peek Fresh ==
    /// Returns the entry if it is still fresh at `now_ms`.
    ///
    /// A fresh hit is promoted to most recently used. An expired entry is
    /// left where it is.
    pub fn peek_fresh(&mut self, key: &CacheKey, now_ms: u64) -> Option<&CacheEntry<T>> {
        let fresh = self
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now_ms, self.cache_time_ms));
        if !fresh {
            return None;
        }

        self.lru.touch(key);
        self.entries.get(key)
    }

    // == Is Expired ==
    /// Checks whether the entry for `key` is stale at `now_ms`.
    ///
    /// An absent key reports as expired; callers wanting presence should ask
    /// [`has`](Self::has) first.
    pub fn is_expired(&self, key: &CacheKey, now_ms: u64) -> bool {
        self.entries
            .get(key)
            .map_or(true, |entry| entry.is_expired(now_ms, self.cache_time_ms))
    }

    // == Put ==
    /// Stores `value` under `key`, stamped at `now_ms`.
    ///
    /// An existing entry is replaced and moves to the back. Otherwise, if the
    /// store is at capacity, exactly one least recently used entry is evicted
    /// first. Returns the evicted key, if any.
    pub fn put(&mut self, key: CacheKey, value: T, now_ms: u64) -> Option<CacheKey> {
        let mut evicted = None;

        if self.entries.remove(&key).is_none() && self.entries.len() >= self.max_cache {
            if let Some(oldest) = self.lru.evict_oldest() {
                self.entries.remove(&oldest);
                debug!(key = %oldest, "evicted least recently used entry");
                evicted = Some(oldest);
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, now_ms));
        self.lru.touch(&key);

        evicted
    }

    // == Remove ==
    /// Removes an entry by key, returning it if it was present.
    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        Some(entry)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Purge Expired ==
    /// Removes all entries that are stale at `now_ms`.
    ///
    /// Returns the removed keys.
    pub fn purge_expired(&mut self, now_ms: u64) -> Vec<CacheKey> {
        let ttl = self.cache_time_ms;
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now_ms, ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        expired
    }

    /// Iterates keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.lru.iter()
    }

    // == Configuration ==
    pub fn max_cache(&self) -> usize {
        self.max_cache
    }

    /// Changes the capacity. Takes effect on the next insertion; existing
    /// entries are not evicted down to the new size.
    pub fn set_max_cache(&mut self, max_cache: usize) {
        self.max_cache = max_cache;
    }

    pub fn cache_time_ms(&self) -> u64 {
        self.cache_time_ms
    }

    pub fn set_cache_time_ms(&mut self, cache_time_ms: u64) {
        self.cache_time_ms = cache_time_ms;
    }

    // == Length ==
    /// Returns the current number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
