//! LRU Cache Module
//!
//! Public cache facade: composes key hashing, the eviction store, the
//! deduplication broker and the optional persisted mirror.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{
    hash_key, CacheKey, Clock, DeduplicationBroker, EvictionStore, SystemClock, Waiter,
};
use crate::config::CacheOptions;
use crate::error::Result;
use crate::storage::{MemoryStorage, PersistentStorage};

// == Lookup ==
/// Outcome of [`LruCache::get`].
#[derive(Debug)]
pub enum Lookup<T> {
    /// Fresh cached value
    Hit(T),
    /// Nothing cached; the caller should fetch the value and `set` it.
    ///
    /// With notifications enabled, a miss also makes the caller the producer
    /// of that key: it must finish with `set` or `decline_notification`.
    Miss,
    /// Another caller is already fetching this key
    Wait(Waiter<T>),
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Lookup::Miss)
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, Lookup::Wait(_))
    }

    /// Returns the hit value, if any, without awaiting.
    pub fn into_hit(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            _ => None,
        }
    }

    /// Waits for the lookup to finish.
    ///
    /// `Hit` and `Miss` complete immediately; `Wait` completes when the
    /// producer settles or declines.
    pub async fn resolve(self) -> Result<Option<T>> {
        match self {
            Lookup::Hit(value) => Ok(Some(value)),
            Lookup::Miss => Ok(None),
            Lookup::Wait(waiter) => waiter.await.map(Some),
        }
    }
}

// == LRU Cache ==
/// Bounded, time-aware cache with optional request deduplication.
///
/// All operations are synchronous. The only suspension point is the
/// [`Waiter`] handed out by [`get`](Self::get) while another caller is
/// producing the same key.
#[derive(Debug)]
pub struct LruCache<T> {
    store: EvictionStore<T>,
    broker: DeduplicationBroker<T>,
    black_list: BTreeSet<String>,
    use_notice: bool,
    persist: bool,
    storage: Arc<dyn PersistentStorage>,
    /// Mirror encoder, absent for caches built without one
    encode: Option<fn(&T) -> Result<String>>,
    clock: Arc<dyn Clock>,
}

impl<T: Serialize> Default for LruCache<T> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl<T: Serialize> LruCache<T> {
    // == Constructor ==
    /// Creates a cache from `options`.
    ///
    /// When `options.storage` is set, entries are mirrored as JSON into an
    /// in-memory [`MemoryStorage`] until another backend is supplied with
    /// [`with_storage_backend`](Self::with_storage_backend).
    pub fn new(options: CacheOptions) -> Self {
        Self::build(options, Some(encode_json::<T>))
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

impl<T> LruCache<T> {
    /// Creates a cache for values that have no serialized form.
    ///
    /// `options.storage` is ignored; nothing is ever mirrored.
    pub fn without_mirror(options: CacheOptions) -> Self {
        Self::build(options.with_storage(false), None)
    }

    fn build(options: CacheOptions, encode: Option<fn(&T) -> Result<String>>) -> Self {
        Self {
            store: EvictionStore::new(options.max_cache, options.cache_time.saturating_mul(1000)),
            broker: DeduplicationBroker::new(),
            black_list: options.black_list.into_iter().collect(),
            use_notice: options.use_notice,
            persist: options.storage && encode.is_some(),
            storage: Arc::new(MemoryStorage::new()),
            encode,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the persisted storage backend.
    pub fn with_storage_backend(mut self, storage: Arc<dyn PersistentStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // == Has ==
    /// True if an entry is stored for `key`, stale or not.
    ///
    /// Always false for blocked keys.
    pub fn has(&self, key: &str) -> bool {
        !self.is_blocked(key) && self.store.has(&hash_key(key))
    }

    // == Get ==
    /// Looks up `key`.
    ///
    /// Blocked keys always miss and are never tracked. A fresh hit is promoted
    /// to most recently used. On a miss with notifications enabled, the first
    /// caller becomes the producer (and gets `Miss`); later callers get a
    /// [`Lookup::Wait`] until the producer reports back.
    pub fn get(&mut self, key: &str) -> Lookup<T>
    where
        T: Clone,
    {
        if self.is_blocked(key) {
            return Lookup::Miss;
        }

        let hashed = hash_key(key);
        let now = self.clock.now_ms();

        if let Some(entry) = self.store.peek_fresh(&hashed, now) {
            return Lookup::Hit(entry.value.clone());
        }

        if !self.use_notice {
            return Lookup::Miss;
        }

        match self.broker.await_value(&hashed) {
            Some(waiter) => Lookup::Wait(waiter),
            None => {
                debug!(key = %hashed, "elected producer for cache miss");
                self.broker.begin_tracking(hashed);
                Lookup::Miss
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` and releases any waiters.
    ///
    /// No-op for blocked keys.
    pub fn set(&mut self, key: &str, value: T)
    where
        T: Clone,
    {
        if self.is_blocked(key) {
            return;
        }

        let hashed = hash_key(key);
        let now = self.clock.now_ms();

        self.mirror_write(&hashed, &value);
        if self.use_notice {
            self.broker.settle(&hashed, &value);
        }
        if let Some(evicted) = self.store.put(hashed, value, now) {
            self.mirror_remove(&evicted);
        }
    }

    // == Delete ==
    /// Removes the entry for `key`. Pending waiters are unaffected.
    pub fn delete(&mut self, key: &str) {
        let hashed = hash_key(key);
        self.store.remove(&hashed);
        self.mirror_remove(&hashed);
    }

    // == Clear ==
    /// Empties the cache and the persisted storage. Pending waiters are
    /// unaffected.
    pub fn clear(&mut self) {
        self.store.clear();
        if self.persist {
            if let Err(e) = self.storage.clear() {
                warn!(error = %e, "failed to clear persisted storage");
            }
        }
    }

    // == Decline Notification ==
    /// Reports that the producer of `key` could not obtain a value.
    ///
    /// Every queued waiter is rejected and the next `get` elects a new
    /// producer. Returns the number of waiters rejected.
    pub fn decline_notification(&mut self, key: &str) -> usize {
        self.decline_with(key, None)
    }

    /// Like [`decline_notification`](Self::decline_notification), passing
    /// `reason` on to the waiters.
    pub fn decline_notification_with(&mut self, key: &str, reason: impl Into<String>) -> usize {
        self.decline_with(key, Some(reason.into()))
    }

    fn decline_with(&mut self, key: &str, reason: Option<String>) -> usize {
        let hashed = hash_key(key);
        if !self.broker.is_pending(&hashed) {
            return 0;
        }

        let count = self.broker.reject(&hashed, reason);
        if count > 0 {
            warn!(key = %hashed, waiters = count, "producer declined, rejecting waiters");
        }
        count
    }

    // == Purge Expired ==
    /// Removes every stale entry now, along with its mirrored copy.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let removed = self.store.purge_expired(self.clock.now_ms());
        for key in &removed {
            self.mirror_remove(key);
        }
        removed.len()
    }

    /// Hashed form of `key`.
    pub fn get_hash_key(&self, key: &str) -> CacheKey {
        hash_key(key)
    }

    // == Configuration ==
    pub fn max_cache(&self) -> usize {
        self.store.max_cache()
    }

    /// Changes the capacity. Overflow is only resolved on the next `set`.
    pub fn set_max_cache(&mut self, max_cache: usize) {
        self.store.set_max_cache(max_cache);
    }

    /// TTL in milliseconds.
    pub fn cache_time_ms(&self) -> u64 {
        self.store.cache_time_ms()
    }

    /// Sets the TTL in seconds.
    pub fn set_cache_time(&mut self, secs: u64) {
        self.store.set_cache_time_ms(secs.saturating_mul(1000));
    }

    /// Blocked keys, in sorted order.
    pub fn black_list(&self) -> Vec<String> {
        self.black_list.iter().cloned().collect()
    }

    /// Replaces the blocked keys.
    pub fn set_black_list<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.black_list = keys.into_iter().map(Into::into).collect();
    }

    /// Adds to the blocked keys.
    pub fn extend_black_list<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.black_list.extend(keys.into_iter().map(Into::into));
    }

    pub fn is_blocked(&self, key: &str) -> bool {
        self.black_list.contains(key)
    }

    pub fn use_notice(&self) -> bool {
        self.use_notice
    }

    pub fn set_use_notice(&mut self, use_notice: bool) {
        self.use_notice = use_notice;
    }

    /// True if entries are mirrored into persisted storage.
    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn storage_backend(&self) -> &Arc<dyn PersistentStorage> {
        &self.storage
    }

    // == Introspection ==
    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// True if a fetch for `key` is presumed in flight.
    pub fn is_pending(&self, key: &str) -> bool {
        self.broker.is_pending(&hash_key(key))
    }

    /// Number of keys with a fetch presumed in flight.
    pub fn pending_count(&self) -> usize {
        self.broker.pending_count()
    }

    // == Persisted Mirror ==
    fn mirror_write(&self, key: &CacheKey, value: &T) {
        let Some(encode) = self.encode.filter(|_| self.persist) else {
            return;
        };

        let result = encode(value).and_then(|json| self.storage.set_item(key.as_str(), &json));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "failed to mirror entry to persisted storage");
        }
    }

    fn mirror_remove(&self, key: &CacheKey) {
        if !self.persist {
            return;
        }

        if let Err(e) = self.storage.remove_item(key.as_str()) {
            warn!(key = %key, error = %e, "failed to remove mirrored entry");
        }
    }
}
