//! Configuration Module
//!
//! Construction options for [`LruCache`](crate::cache::LruCache), loadable from
//! serde-compatible sources or environment variables.

use std::env;

use serde::Deserialize;

/// Default entry capacity
pub const DEFAULT_MAX_CACHE: usize = 20;

/// Default time-to-live in seconds
pub const DEFAULT_CACHE_TIME_SECS: u64 = 10;

/// Cache construction options.
///
/// Every field is optional when deserializing; the camelCase aliases match the
/// option names used by existing client configs. Values are not validated, so a
/// zero capacity or TTL is accepted and simply makes the cache degenerate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Maximum number of entries the cache can hold
    #[serde(alias = "maxCache")]
    pub max_cache: usize,
    /// Time-to-live in seconds
    #[serde(alias = "cacheTime")]
    pub cache_time: u64,
    /// Mirror entries into persisted storage
    pub storage: bool,
    /// Logical keys that bypass caching and deduplication
    #[serde(alias = "blackList")]
    pub black_list: Vec<String>,
    /// Collapse concurrent misses for the same key
    #[serde(alias = "useNotice")]
    pub use_notice: bool,
}

impl CacheOptions {
    /// Creates a new CacheOptions by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LRU_MAX_CACHE` - Maximum cache entries (default: 20)
    /// - `LRU_CACHE_TIME` - TTL in seconds (default: 10)
    /// - `LRU_STORAGE` - Mirror to persisted storage (default: false)
    /// - `LRU_BLACK_LIST` - Comma separated blocked keys (default: empty)
    /// - `LRU_USE_NOTICE` - Enable request deduplication (default: false)
    pub fn from_env() -> Self {
        Self {
            max_cache: env::var("LRU_MAX_CACHE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CACHE),
            cache_time: env::var("LRU_CACHE_TIME")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CACHE_TIME_SECS),
            storage: env::var("LRU_STORAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            black_list: env::var("LRU_BLACK_LIST")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            use_notice: env::var("LRU_USE_NOTICE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Sets the entry capacity.
    pub fn with_max_cache(mut self, max_cache: usize) -> Self {
        self.max_cache = max_cache;
        self
    }

    /// Sets the TTL in seconds.
    pub fn with_cache_time(mut self, secs: u64) -> Self {
        self.cache_time = secs;
        self
    }

    /// Enables or disables the persisted mirror.
    pub fn with_storage(mut self, storage: bool) -> Self {
        self.storage = storage;
        self
    }

    /// Sets the blocked keys.
    pub fn with_black_list<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.black_list = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables request deduplication.
    pub fn with_use_notice(mut self, use_notice: bool) -> Self {
        self.use_notice = use_notice;
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_cache: DEFAULT_MAX_CACHE,
            cache_time: DEFAULT_CACHE_TIME_SECS,
            storage: false,
            black_list: Vec::new(),
            use_notice: false,
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = CacheOptions::default();
        assert_eq!(options.max_cache, 20);
        assert_eq!(options.cache_time, 10);
        assert!(!options.storage);
        assert!(options.black_list.is_empty());
        assert!(!options.use_notice);
    }

    #[test]
    fn test_options_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("LRU_MAX_CACHE");
        env::remove_var("LRU_CACHE_TIME");
        env::remove_var("LRU_STORAGE");
        env::remove_var("LRU_BLACK_LIST");
        env::remove_var("LRU_USE_NOTICE");

        let options = CacheOptions::from_env();
        assert_eq!(options, CacheOptions::default());
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let json = r#"{"maxCache": 5, "cacheTime": 1, "storage": true,
                       "blackList": ["/login"], "useNotice": true}"#;
        let options: CacheOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.max_cache, 5);
        assert_eq!(options.cache_time, 1);
        assert!(options.storage);
        assert_eq!(options.black_list, vec!["/login".to_string()]);
        assert!(options.use_notice);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: CacheOptions = serde_json::from_str(r#"{"max_cache": 3}"#).unwrap();
        assert_eq!(options.max_cache, 3);
        assert_eq!(options.cache_time, DEFAULT_CACHE_TIME_SECS);
        assert!(!options.use_notice);
    }

    #[test]
    fn test_options_builder() {
        let options = CacheOptions::default()
            .with_max_cache(0)
            .with_cache_time(0)
            .with_black_list(["a", "b"])
            .with_use_notice(true);
        assert_eq!(options.max_cache, 0);
        assert_eq!(options.cache_time, 0);
        assert_eq!(options.black_list.len(), 2);
        assert!(options.use_notice);
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(parse_list(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
        assert!(parse_list("").is_empty());
    }
}
