//! Storage engines: the durable key/blob stores that configuration resolves to.
//!
//! The rest of the runtime only ever sees `Arc<dyn Storage>`. Which engine
//! sits behind it is decided by configuration through the module registry.
//!
//! # Keys
//!
//! Keys are relative, `/`-separated paths such as `certificates/acme/site.crt`.
//! Empty keys, absolute keys, backslashes and `..` segments are rejected so
//! that every engine can map keys onto its own namespace safely.

pub mod file_storage;

use std::fmt;
use std::time::SystemTime;

use crate::error::{Result, StorageError};

pub use file_storage::FileStorage;

/// Operations every storage engine provides.
///
/// Implementations must be safe to share between threads. Locks are
/// advisory and coordinate between processes that use the same engine
/// configuration.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Create or replace the value stored at `key`.
    fn store(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Read the value stored at `key`.
    fn load(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove `key` and everything below it.
    fn delete(&self, key: &str) -> Result<()>;

    /// Whether `key` exists.
    fn exists(&self, key: &str) -> bool;

    /// List keys under `prefix`.
    ///
    /// Without `recursive` only direct children are returned; with it every
    /// descendant is. Keys are sorted.
    fn list(&self, prefix: &str, recursive: bool) -> Result<Vec<String>>;

    /// Metadata about `key`.
    fn stat(&self, key: &str) -> Result<KeyInfo>;

    /// Block until the exclusive lock for `key` is held.
    fn lock(&self, key: &str) -> Result<()>;

    /// Release a lock obtained with [`Storage::lock`].
    fn unlock(&self, key: &str) -> Result<()>;

    /// Human-readable identity of this engine instance
    fn describe(&self) -> String;
}

/// Metadata about a stored key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub key: String,
    pub modified: SystemTime,
    pub size: u64,
    /// True for values, false for key prefixes ("directories")
    pub is_terminal: bool,
}

/// Check that `key` is a usable storage key.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "key cannot be empty"));
    }
    if key.starts_with('/') {
        return Err(StorageError::invalid_key(key, "key must be relative"));
    }
    if key.contains('\\') {
        return Err(StorageError::invalid_key(key, "key must use '/' as separator"));
    }
    if key_segments(key).next().is_none() {
        return Err(StorageError::invalid_key(key, "key has no path segments"));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::invalid_key(
            key,
            "parent segments are not allowed",
        ));
    }
    Ok(())
}

/// Non-empty segments of a key
pub fn key_segments(key: &str) -> impl Iterator<Item = &str> {
    key.split('/').filter(|s| !s.is_empty() && *s != ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_relative_keys() {
        assert!(validate_key("certificates/acme/site.crt").is_ok());
        assert!(validate_key("single").is_ok());
        assert!(validate_key("a/./b").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_escapes() {
        for key in ["", "/etc/passwd", "a/../../b", "..", "a\\b", ".", "./"] {
            let result = validate_key(key);
            assert!(
                matches!(result, Err(StorageError::InvalidKey { .. })),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_key_segments() {
        let segments: Vec<_> = key_segments("a//b/./c/").collect();
        assert_eq!(segments, vec!["a", "b", "c"]);
    }
}
