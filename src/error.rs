//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Misses, expirations and blocked keys are never errors. The only failure a
/// lookup can observe is [`CacheError::Declined`], delivered to waiters when
/// the producer of a pending key gives up.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The producer of a pending key declined to supply a value
    #[error("Notification declined for {key}{}", fmt_reason(.reason))]
    Declined {
        /// Hashed key the waiter was registered under
        key: String,
        /// Optional explanation supplied by the producer
        reason: Option<String>,
    },

    /// Persisted storage collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Value could not be encoded for the persisted mirror
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File-backed storage I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_reason(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}

impl CacheError {
    /// Creates a [`CacheError::Declined`] without a reason.
    pub fn declined(key: impl Into<String>) -> Self {
        CacheError::Declined {
            key: key.into(),
            reason: None,
        }
    }

    /// Returns true if this is a [`CacheError::Declined`].
    pub fn is_declined(&self) -> bool {
        matches!(self, CacheError::Declined { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
