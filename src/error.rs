//! Error handling for storage engines and conversions
//!
//! Library code returns `StorageError`; the configuration and CLI layers wrap
//! it with `anyhow` context.

use thiserror::Error;

/// Main error type for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO errors from the underlying file system
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested key does not exist
    #[error("Key not found: {key}")]
    NotFound { key: String },

    /// The key cannot be mapped onto the storage layout
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Waiting for a lock exceeded the configured timeout
    #[error("Timed out waiting for lock on '{key}'")]
    LockTimeout { key: String },

    /// Unlock was requested for a key that holds no lock
    #[error("Key '{key}' is not locked")]
    NotLocked { key: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A storage module could not produce an engine
    #[error("Storage module '{module}' failed to build an engine: {reason}")]
    Conversion { module: String, reason: String },

    /// Module registration or lookup errors
    #[error("Module error: {0}")]
    Module(String),
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Create a not-found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an invalid-key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a conversion error naming the module that failed
    pub fn conversion(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the key does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
