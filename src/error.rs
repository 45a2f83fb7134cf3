//! Store Error Types
//!
//! Failure cases surfaced by the remote document store and the sync engine.
//!
//! # Error Categories
//!
//! - `Transport` - network or I/O failures reaching the remote store
//! - `PermissionDenied` - the store rejected the operation for this user
//! - `NotFound` - a per-document operation targeted a document that no
//!   longer exists remotely
//! - `Subscription` - a live subscription could not be established
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread
//! boundaries.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by remote store operations and subscription setup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network or I/O failure reaching the remote store
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },

    /// The remote store rejected the operation for this user
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Human-readable error message
        message: String,
    },

    /// A per-document operation targeted a missing document
    #[error("document not found: {id}")]
    NotFound {
        /// Id of the missing document
        id: Uuid,
    },

    /// A live subscription could not be established
    #[error("subscription error: {message}")]
    Subscription {
        /// Human-readable error message
        message: String,
    },
}

impl StoreError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new permission error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    /// Create a new subscription error
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription {
            message: message.into(),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
