//! Directory-backed storage.
//!
//! All slots live in one JSON document. Writes go to a temp file that is
//! renamed over the document, so a crash leaves either the old or the new
//! contents. A lock file keeps a second process out of the directory.

use super::backend::StorageBackend;
use crate::error::{Result, StateError};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the slot document inside the storage directory.
const ITEMS_FILE: &str = "storage.json";

/// Name of the lock file inside the storage directory.
const LOCK_FILE: &str = "LOCK";

/// Key-value storage persisted to a directory.
pub struct FileStorage {
    /// Path to the slot document.
    path: PathBuf,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// In-memory copy of every slot.
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage in `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let lock_file = Self::acquire_lock(dir)?;
        let path = dir.join(ITEMS_FILE);

        let items: BTreeMap<String, String> = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)
                .map_err(|e| StateError::Deserialization(format!("{}: {}", path.display(), e)))?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), slots = items.len(), "opened file storage");

        Ok(Self {
            path,
            _lock_file: lock_file,
            items: RwLock::new(items),
        })
    }

    fn acquire_lock(dir: &Path) -> Result<File> {
        let lock_file = File::create(dir.join(LOCK_FILE))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StateError::Locked)?;

        Ok(lock_file)
    }

    /// Write every slot to disk.
    fn flush(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(items)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&tmp_path)?;
        file.write_all(&encoded)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Path of the slot document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    // Writes flush a modified copy; memory only changes once disk has.

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write();
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.flush(&next)?;
        *items = next;
        Ok(())
    }
}
