//! Errors surfaced by repository and intent operations.

use tasklist_core::TaskId;
use tasklist_store::StoreError;

/// Errors surfaced by [`TaskRepository`](crate::TaskRepository) operations.
#[derive(thiserror::Error, Debug)]
pub enum TaskError {
    /// Target task vanished, typically deleted concurrently.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// Backing store returned an error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// A task record could not be encoded for the store.
    #[error("failed to encode task: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TaskError {
    /// Returns true for the benign lost-race case.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
