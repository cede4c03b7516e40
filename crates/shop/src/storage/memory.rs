//! In-memory storage for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{KeyValueStore, StorageError, validate_key};

/// A [`KeyValueStore`] backed by a `HashMap`.
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// the cart or session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let store = MemoryStore::new();
        assert_eq!(store.load("token").unwrap(), None);

        store.save("token", "abc").unwrap();
        assert_eq!(store.load("token").unwrap().as_deref(), Some("abc"));

        store.save("token", "def").unwrap();
        assert_eq!(store.load("token").unwrap().as_deref(), Some("def"));

        store.clear("token").unwrap();
        assert_eq!(store.load("token").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_absent_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.clear("cart").is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save("cart", "[]").unwrap();
        assert_eq!(handle.load("cart").unwrap().as_deref(), Some("[]"));
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let store = MemoryStore::new();
        assert!(store.save("../etc", "x").is_err());
    }
}
