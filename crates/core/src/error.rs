//! Errors of the upload, download and lifecycle operations.

use fileitem_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::item::ItemError;
use crate::lifecycle::HookError;
use crate::storage::StorageError;

/// File item operation errors.
#[derive(Debug, Error)]
pub enum FileItemError {
    /// Upload request carried no file parts.
    #[error("no files were uploaded")]
    NoFiles,

    /// Upload request carried more parts than allowed.
    #[error("too many files: at most {max} per upload")]
    TooManyFiles {
        /// Maximum parts per request.
        max: usize,
    },

    /// A part exceeded the per-file size limit.
    #[error("file too large: exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Maximum file size.
        max: u64,
    },

    /// Requester may not perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Upload allowance used up.
    #[error("upload quota exceeded: {used} of {limit} bytes used")]
    QuotaExceeded {
        /// Bytes already stored.
        used: u64,
        /// Allowance in bytes.
        limit: u64,
    },

    /// Item is not a file item of the configured type.
    #[error("item {0} is not a file item")]
    InvalidItem(Uuid),

    /// Item or stored content missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Content could not be persisted.
    #[error("failed to store file at {path}: {reason}")]
    StorageWriteFailure {
        /// Storage key.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// Request refused by the item engine or a lifecycle hook.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Other storage failure.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Item engine failure.
    #[error("item engine error: {0}")]
    Item(String),
}

impl FileItemError {
    /// Create a permission denied error.
    #[must_use]
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Classify a failure to store content at `path`.
    #[must_use]
    pub fn from_store(path: &str, err: StorageError) -> Self {
        match err {
            StorageError::FileTooLarge { max } => Self::FileTooLarge { max },
            StorageError::WriteFailure { reason, .. } => Self::StorageWriteFailure {
                path: path.to_string(),
                reason,
            },
            other => Self::StorageWriteFailure {
                path: path.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<StorageError> for FileItemError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound(format!("stored file {key}")),
            StorageError::FileTooLarge { max } => Self::FileTooLarge { max },
            StorageError::WriteFailure { key, reason } => {
                Self::StorageWriteFailure { path: key, reason }
            }
            other => Self::Storage(other),
        }
    }
}

impl From<ItemError> for FileItemError {
    fn from(err: ItemError) -> Self {
        match err {
            ItemError::NotFound(id) => Self::NotFound(format!("item {id}")),
            ItemError::PermissionDenied(msg) => Self::PermissionDenied(msg),
            ItemError::QuotaExceeded { used, limit } => Self::QuotaExceeded { used, limit },
            ItemError::Hook(HookError::Storage(e)) => e.into(),
            ItemError::Hook(HookError::Rejected(msg)) | ItemError::Rejected(msg) => {
                Self::Rejected(msg)
            }
            ItemError::Engine(msg) => Self::Item(msg),
        }
    }
}

impl From<FileItemError> for AppError {
    fn from(err: FileItemError) -> Self {
        let message = err.to_string();
        match err {
            FileItemError::NoFiles => AppError::NotAcceptable(message),
            FileItemError::TooManyFiles { .. }
            | FileItemError::InvalidItem(_)
            | FileItemError::Rejected(_) => AppError::Validation(message),
            FileItemError::FileTooLarge { .. } => AppError::PayloadTooLarge(message),
            FileItemError::PermissionDenied(_) | FileItemError::QuotaExceeded { .. } => {
                AppError::Forbidden(message)
            }
            FileItemError::NotFound(_) => AppError::NotFound(message),
            FileItemError::StorageWriteFailure { .. } | FileItemError::Storage(_) => {
                AppError::Storage(message)
            }
            FileItemError::Item(_) => AppError::Internal(message),
        }
    }
}
