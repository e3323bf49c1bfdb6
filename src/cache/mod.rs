//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and
//! deduplication of concurrent misses.

mod clock;
mod entry;
mod hash;
mod lru;
mod lru_cache;
mod notify;
mod shared;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use hash::{hash_key, CacheKey};
pub use lru::LruTracker;
pub use lru_cache::{Lookup, LruCache};
pub use notify::{DeduplicationBroker, Waiter};
pub use shared::{get_or_fetch, FetchError, SharedLruCache};
pub use store::EvictionStore;
