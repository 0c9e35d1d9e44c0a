//! Storage backend contract and the in-memory backend.

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A synchronous string key-value store, shaped like `localStorage`.
pub trait StorageBackend: Send + Sync {
    /// Whether the backend can currently be used. An unavailable backend is
    /// treated exactly like a missing one.
    fn is_available(&self) -> bool {
        true
    }

    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    disabled: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that reports itself unavailable, like `localStorage` in a
    /// locked-down browser profile.
    pub fn disabled() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            disabled: true,
        }
    }

    /// Number of stored slots.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn is_available(&self) -> bool {
        !self.disabled
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}
