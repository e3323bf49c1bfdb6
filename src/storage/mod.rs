//! Storage Module
//!
//! Persisted key/string stores the cache can mirror its entries into.
//!
//! The cache only ever writes through this interface; reading a mirrored
//! value back is left to whoever owns the storage.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

/// External key/string store.
pub trait PersistentStorage: Send + Sync + std::fmt::Debug {
    /// Returns the string stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Removes everything.
    fn clear(&self) -> Result<()>;
}
