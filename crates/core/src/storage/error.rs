//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage provider configuration error. Fatal at startup.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// File not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Writing an incoming stream to the backend failed.
    #[error("failed to write {key}: {reason}")]
    WriteFailure {
        /// Storage key being written.
        key: String,
        /// Underlying failure.
        reason: String,
    },

    /// Stream exceeded the configured per-file limit.
    #[error("file size exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Maximum allowed size.
        max: u64,
    },

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Invalid storage key format.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a write failure for `key`.
    #[must_use]
    pub fn write_failure(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::WriteFailure {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach the key to an opendal error, keeping `NotFound` distinguishable.
    pub(crate) fn from_opendal(key: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}
