//! Error types for tree store operations.

use thiserror::Error;

use crate::path::StorePath;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Target node does not exist.
    #[error("Node not found: {0}")]
    NotFound(StorePath),

    /// Path string is not a valid store path.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// Offending input.
        path: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The store went away while a subscription was open.
    #[error("Store connection closed")]
    Closed,

    /// Failed to encode or decode a stored value.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other unclassified error.
    #[error("Other error: {0}")]
    Other(String),
}

impl StoreError {
    /// Returns true when the store reported a missing node.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
