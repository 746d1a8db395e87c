//! Errors reported by the item collaborators.

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::HookError;

/// Item engine, membership, and limiter errors.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Item not found.
    #[error("item not found: {0}")]
    NotFound(Uuid),

    /// Actor lacks the required permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Member has used up their upload allowance.
    #[error("upload quota exceeded: {used} of {limit} bytes used")]
    QuotaExceeded {
        /// Bytes already stored by the member.
        used: u64,
        /// Allowance in bytes.
        limit: u64,
    },

    /// Request is not acceptable to the engine.
    #[error("item rejected: {0}")]
    Rejected(String),

    /// Engine failed.
    #[error("item engine error: {0}")]
    Engine(String),

    /// A lifecycle hook aborted the operation.
    #[error("lifecycle hook failed: {0}")]
    Hook(#[from] HookError),
}

impl ItemError {
    /// Create a permission denied error.
    #[must_use]
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a rejection.
    #[must_use]
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create an engine error.
    #[must_use]
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}
