//! User intents dispatched from the render layer.

use std::sync::Arc;
use tasklist_core::{Task, TaskId, TaskText};
use tasklist_store::TreeStore;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::TaskError;
use crate::overlay::{PendingOp, PendingToken};
use crate::repository::{DeleteOutcome, TaskRepository};

/// What happened to an intent that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// A task was created under the returned id.
    Added(TaskId),
    /// The completion flag was written.
    Updated,
    /// The task was moved to the archive.
    Archived,
    /// The intent was dropped without being treated as a failure.
    Ignored(IgnoreReason),
}

/// Why an intent was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The task text was blank; no store call was made.
    EmptyText,
    /// The target task no longer exists.
    VanishedTask,
    /// The target is an optimistic entry the store has not assigned an id to yet.
    PendingCreation,
}

/// Validates raw UI input and forwards it to the repository.
///
/// Store failures are logged and returned to the caller, never swallowed.
pub struct TaskIntents<S> {
    repo: Arc<TaskRepository<S>>,
    optimistic: bool,
}

impl<S> TaskIntents<S> {
    /// Wrap a repository using the given sync settings.
    #[must_use]
    pub const fn new(repo: Arc<TaskRepository<S>>, sync: &SyncConfig) -> Self {
        Self {
            repo,
            optimistic: sync.optimistic,
        }
    }

    /// Repository the intents are dispatched to.
    #[must_use]
    pub const fn repository(&self) -> &Arc<TaskRepository<S>> {
        &self.repo
    }

    fn settle<T>(&self, token: Option<PendingToken>, result: Result<T, TaskError>) -> Result<T, TaskError> {
        if let (Some(token), Err(_)) = (token, &result) {
            self.repo.withdraw(token);
        }
        result
    }
}

impl<S: TreeStore> TaskIntents<S> {
    /// Handle an "add task" submission.
    ///
    /// # Errors
    /// Returns [`TaskError::Store`] if the store rejects the write.
    pub async fn add_task(&self, raw: &str) -> Result<IntentOutcome, TaskError> {
        let Ok(text) = TaskText::parse(raw) else {
            debug!("Dropping add intent with blank text");
            return Ok(IntentOutcome::Ignored(IgnoreReason::EmptyText));
        };

        let token = self.optimistic.then(|| {
            let placeholder = Task {
                id: self.repo.provisional_id(),
                text: text.as_str().to_owned(),
                is_checked: false,
            };
            self.repo.stage(PendingOp::Insert(placeholder))
        });

        let result = self.repo.create_task(text).await;
        match self.settle(token, result) {
            Ok(id) => Ok(IntentOutcome::Added(id)),
            Err(err) => {
                warn!(error = %err, "Failed to add task");
                Err(err)
            }
        }
    }

    /// Handle a checkbox toggle.
    ///
    /// # Errors
    /// Returns [`TaskError::Store`] if the store rejects the update. A task that
    /// vanished concurrently is reported as [`IgnoreReason::VanishedTask`].
    pub async fn toggle_task(&self, id: &TaskId, checked: bool) -> Result<IntentOutcome, TaskError> {
        if id.is_provisional() {
            return Ok(IntentOutcome::Ignored(IgnoreReason::PendingCreation));
        }

        let token = self.optimistic.then(|| {
            self.repo.stage(PendingOp::SetChecked {
                id: id.clone(),
                checked,
            })
        });

        let result = self.repo.set_checked(id, checked).await;
        match self.settle(token, result) {
            Ok(()) => Ok(IntentOutcome::Updated),
            Err(TaskError::NotFound(_)) => {
                debug!(task = %id, "Toggle target vanished");
                Ok(IntentOutcome::Ignored(IgnoreReason::VanishedTask))
            }
            Err(err) => {
                warn!(task = %id, error = %err, "Failed to toggle task");
                Err(err)
            }
        }
    }

    /// Handle a delete click.
    ///
    /// # Errors
    /// Returns [`TaskError::Store`] if any step of the archive move fails.
    pub async fn delete_task(&self, id: &TaskId) -> Result<IntentOutcome, TaskError> {
        if id.is_provisional() {
            return Ok(IntentOutcome::Ignored(IgnoreReason::PendingCreation));
        }

        let token = self
            .optimistic
            .then(|| self.repo.stage(PendingOp::Remove(id.clone())));

        let result = self.repo.delete_task(id).await;
        match self.settle(token, result) {
            Ok(DeleteOutcome::Archived) => Ok(IntentOutcome::Archived),
            Ok(DeleteOutcome::AlreadyGone) => {
                if let Some(token) = token {
                    self.repo.withdraw(token);
                }
                debug!(task = %id, "Delete target vanished");
                Ok(IntentOutcome::Ignored(IgnoreReason::VanishedTask))
            }
            Err(err) => {
                warn!(task = %id, error = %err, "Failed to delete task");
                Err(err)
            }
        }
    }
}
