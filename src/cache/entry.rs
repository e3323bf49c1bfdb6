//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// Represents a single cache entry with value and storage timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Time the value was stored (Unix milliseconds)
    pub stored_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms`.
    pub fn new(value: T, now_ms: u64) -> Self {
        Self {
            value,
            stored_at: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was stored.
    ///
    /// A clock that moved backwards yields an age of zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.stored_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl_ms`.
    ///
    /// Boundary condition: an entry whose age equals the TTL is still fresh;
    /// it expires only once its age is strictly greater.
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) > ttl_ms
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value", 1_000);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.stored_at, 1_000);
        assert!(!entry.is_expired(1_000, 10_000));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(7u32, 0);

        assert!(!entry.is_expired(999, 1_000));
        assert!(entry.is_expired(1_100, 1_000));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new((), 500);

        // Age exactly equal to TTL is still fresh
        assert!(!entry.is_expired(1_500, 1_000));
        assert!(entry.is_expired(1_501, 1_000));
    }

    #[test]
    fn test_zero_ttl_expires_after_any_time() {
        let entry = CacheEntry::new((), 500);

        assert!(!entry.is_expired(500, 0));
        assert!(entry.is_expired(501, 0));
    }

    #[test]
    fn test_clock_moving_backwards() {
        let entry = CacheEntry::new((), 2_000);

        assert_eq!(entry.age_ms(1_000), 0);
        assert!(!entry.is_expired(1_000, 0));
    }
}
