//! Persistent key-value storage.
//!
//! The session token and (optionally) the cart survive restarts by being
//! written to a [`KeyValueStore`]. The shop never depends on a concrete
//! engine: tests use [`MemoryStore`], the CLI uses [`FileStore`].
//!
//! # Keys
//!
//! Keys are short identifiers restricted to `[A-Za-z0-9_-]`. The well-known
//! keys live in [`keys`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Bearer token issued by the auth backend.
    pub const TOKEN: &str = "token";

    /// JSON-encoded cart lines.
    pub const CART: &str = "cart";
}

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains characters outside `[A-Za-z0-9_-]` or is empty.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes are not valid UTF-8.
    #[error("stored value for {0:?} is not valid UTF-8")]
    Encoding(String),
}

/// A persistent string key-value collaborator.
///
/// Implementations must be safe to share between threads; every call is
/// independent and there is no transaction support.
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Load the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the read fails.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Remove the value stored under `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn clear(&self, key: &str) -> Result<(), StorageError>;
}

/// Validate a storage key.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_identifiers() {
        assert!(validate_key("token").is_ok());
        assert!(validate_key("cart-v2_backup").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_paths_and_empty() {
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
        assert!(validate_key("../token").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("with space").is_err());
    }
}
