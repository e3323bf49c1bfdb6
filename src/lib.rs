//! Notice LRU - A bounded, time-aware cache for repeated async lookups
//!
//! Provides LRU eviction, lazy TTL expiration and deduplication of concurrent
//! misses for the same key, with an optional write-through persisted mirror.

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;
pub mod tasks;

pub use cache::{get_or_fetch, Lookup, LruCache, SharedLruCache};
pub use config::CacheOptions;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
