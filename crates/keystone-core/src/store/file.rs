//! JSON-file backed store.

use parking_lot::RwLock;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use super::{KeyValueStore, StoreError};

/// [`KeyValueStore`] persisted as a single pretty-printed JSON object.
///
/// The whole map is held in memory and rewritten on every mutation. A missing file is an
/// empty store; the parent directory is created on first write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, loading existing entries if the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = Self::load_from_disk(&path)?;
        Ok(Self { path, entries: RwLock::new(entries) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "no store file found, starting fresh");
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(path)?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&contents)?;

        info!(count = entries.len(), path = %path.display(), "loaded store from disk");
        Ok(entries)
    }

    fn save_to_disk(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents)?;

        debug!(count = entries.len(), path = %self.path.display(), "saved store to disk");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    // Mutations go to a copy that replaces the in-memory map only once it is on disk.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.save_to_disk(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.save_to_disk(&next)?;
        *entries = next;
        Ok(())
    }
}
