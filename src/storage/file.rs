//! Directory-backed storage, one file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{CacheError, Result};
use crate::storage::PersistentStorage;

/// Extension given to every item file.
const ITEM_EXTENSION: &str = "json";

/// Stores each item as `<dir>/<key>.json`.
///
/// Keys must be usable as file names. The cache only writes hashed keys,
/// which are plain hex.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (and creates, if needed) the storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(&['/', '\\'][..]) || key.starts_with('.') {
            return Err(CacheError::Storage(format!("key is not a valid file name: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.{ITEM_EXTENSION}")))
    }
}

impl PersistentStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.item_path(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.item_path(key)?, value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.item_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == ITEM_EXTENSION) {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
