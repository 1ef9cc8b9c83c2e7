//! Application layer for the shared task list.
//!
//! This crate keeps a local task collection in sync with a [`TreeStore`],
//! implements soft delete, layers optimistic edits over confirmed snapshots,
//! and publishes render-ready view models.
//!
//! [`TreeStore`]: tasklist_store::TreeStore

pub mod config;
pub mod error;
pub mod intents;
pub mod overlay;
pub mod repository;

// Re-exports for convenience
pub use config::{AppConfig, StoreConfig, SyncConfig};
pub use error::TaskError;
pub use intents::{IgnoreReason, IntentOutcome, TaskIntents};
pub use overlay::{PendingOp, PendingToken, SyncedTasks};
pub use repository::{ARCHIVE_ROOT, DeleteOutcome, TASKS_ROOT, TaskRepository};
