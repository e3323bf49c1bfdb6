//! Key Hashing Module
//!
//! Maps arbitrary logical keys to fixed-form cache keys.

use std::fmt::{self, Write};

use sha2::{Digest, Sha256};

// == Cache Key ==
/// Hashed form of a caller-supplied logical key.
///
/// Always 64 lowercase hex characters, so it is safe to use as a storage key
/// or a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hashes a logical key. Any string is valid input, including the empty one.
pub fn hash_key(logical_key: &str) -> CacheKey {
    let digest = Sha256::digest(logical_key.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        // Writing into a String cannot fail.
        let _ = write!(hex, "{b:02x}");
    }
    CacheKey(hex)
}
