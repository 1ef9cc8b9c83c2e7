//! Task repository kept in sync with the store through live subscriptions.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tasklist_core::{
    Task, TaskCollection, TaskId, TaskRecord, TaskText, ViewModel, build_view_model,
};
use tasklist_store::{StoreError, StorePath, Subscription, TreeStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::TaskError;
use crate::overlay::{PendingOp, PendingToken, SyncedTasks};

/// Store path of the active collection.
pub const TASKS_ROOT: &str = "tasks";
/// Store path of the archive collection.
pub const ARCHIVE_ROOT: &str = "deletedTasks";

/// Result of a soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The task was copied to the archive and removed from the active list.
    Archived,
    /// Nothing was active under that id; no store write was made.
    AlreadyGone,
}

/// Step of the soft-delete move, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchivePhase {
    Reading,
    Archiving,
    Removing,
}

impl fmt::Display for ArchivePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reading => "reading",
            Self::Archiving => "archiving",
            Self::Removing => "removing",
        })
    }
}

/// Repository owning the local task collection.
///
/// Construct one per session with [`connect`](Self::connect) and share it by
/// `Arc`; the local cache lives until the repository is dropped.
pub struct TaskRepository<S> {
    store: Arc<S>,
    shared: Arc<Shared>,
    followers: Vec<JoinHandle<()>>,
    tasks_root: StorePath,
    archive_root: StorePath,
}

struct CacheState {
    tasks: SyncedTasks,
    deleted_count: usize,
}

struct Shared {
    state: Mutex<CacheState>,
    tasks_tx: watch::Sender<TaskCollection>,
    deleted_tx: watch::Sender<usize>,
    view_tx: watch::Sender<ViewModel>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                tasks: SyncedTasks::default(),
                deleted_count: 0,
            }),
            tasks_tx: watch::Sender::new(TaskCollection::default()),
            deleted_tx: watch::Sender::new(0),
            view_tx: watch::Sender::new(ViewModel::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // No critical section can leave the state half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_tasks_snapshot(&self, snapshot: Option<&Value>) {
        let (collection, malformed) = TaskCollection::from_snapshot(snapshot);
        for entry in &malformed {
            warn!(key = %entry.key, reason = %entry.reason, "Skipping malformed task entry");
        }
        let mut state = self.lock();
        let superseded = state.tasks.confirm(collection);
        debug!(
            tasks = state.tasks.confirmed().len(),
            superseded, "Applied tasks snapshot"
        );
        self.publish_tasks(&state);
    }

    fn apply_archive_snapshot(&self, snapshot: Option<&Value>) {
        let count = match snapshot {
            Some(Value::Object(entries)) => entries.len(),
            _ => 0,
        };
        let mut state = self.lock();
        state.deleted_count = count;
        debug!(archived = count, "Applied archive snapshot");
        self.deleted_tx.send_replace(count);
        self.publish_view(&state);
    }

    fn publish_tasks(&self, state: &CacheState) {
        self.tasks_tx.send_replace(state.tasks.effective());
        self.publish_view(state);
    }

    fn publish_view(&self, state: &CacheState) {
        let view = build_view_model(&state.tasks.effective(), state.deleted_count);
        self.view_tx.send_replace(view);
    }
}

async fn follow(shared: Arc<Shared>, mut sub: Subscription, apply: fn(&Shared, Option<&Value>)) {
    loop {
        match sub.next().await {
            Ok(snapshot) => apply(&shared, snapshot.as_ref()),
            Err(err) => {
                debug!(path = %sub.path(), error = %err, "Subscription ended");
                break;
            }
        }
    }
}

impl<S: TreeStore> TaskRepository<S> {
    /// Subscribe to both collections and start mirroring them.
    ///
    /// The initial snapshots are applied before this returns; later snapshots
    /// are applied by background tasks on the current Tokio runtime.
    ///
    /// # Errors
    /// Returns an error if either subscription cannot be registered.
    pub async fn connect(store: Arc<S>) -> Result<Self, TaskError> {
        let tasks_root = StorePath::parse(TASKS_ROOT)?;
        let archive_root = StorePath::parse(ARCHIVE_ROOT)?;

        let mut tasks_sub = store.subscribe(&tasks_root).await?;
        let mut archive_sub = store.subscribe(&archive_root).await?;

        let shared = Arc::new(Shared::new());
        shared.apply_tasks_snapshot(tasks_sub.next().await?.as_ref());
        shared.apply_archive_snapshot(archive_sub.next().await?.as_ref());

        let followers = vec![
            tokio::spawn(follow(Arc::clone(&shared), tasks_sub, Shared::apply_tasks_snapshot)),
            tokio::spawn(follow(Arc::clone(&shared), archive_sub, Shared::apply_archive_snapshot)),
        ];

        {
            let state = shared.lock();
            info!(
                tasks = state.tasks.confirmed().len(),
                archived = state.deleted_count,
                "Connected task repository"
            );
        }

        Ok(Self {
            store,
            shared,
            followers,
            tasks_root,
            archive_root,
        })
    }

    /// Create a task from raw input.
    ///
    /// Blank input is ignored without touching the store and yields `None`.
    /// The new task shows up in the collection once the store echoes it back.
    ///
    /// # Errors
    /// Returns [`TaskError::Store`] if the store rejects the write.
    pub async fn add_task(&self, raw: &str) -> Result<Option<TaskId>, TaskError> {
        let Ok(text) = TaskText::parse(raw) else {
            debug!("Ignoring blank task text");
            return Ok(None);
        };
        self.create_task(text).await.map(Some)
    }

    /// Create a task from validated text and return its store-assigned id.
    ///
    /// # Errors
    /// Returns [`TaskError::Store`] if the store rejects the write.
    pub async fn create_task(&self, text: TaskText) -> Result<TaskId, TaskError> {
        let record = serde_json::to_value(TaskRecord::new(text))?;
        let key = self.store.push(&self.tasks_root, record).await?;
        let id = key.parse::<TaskId>().map_err(|err| {
            StoreError::Other(format!("store assigned unusable key '{key}': {err}"))
        })?;
        debug!(task = %id, "Created task");
        Ok(id)
    }

    /// Set the completion flag of a task, leaving its text untouched.
    ///
    /// # Errors
    /// Returns [`TaskError::NotFound`] if the task no longer exists, or
    /// [`TaskError::Store`] for any other store failure.
    pub async fn set_checked(&self, id: &TaskId, checked: bool) -> Result<(), TaskError> {
        let path = self.task_path(id)?;
        let mut fields = Map::new();
        fields.insert(TaskRecord::CHECKED_FIELD.to_owned(), Value::Bool(checked));
        self.store.update(&path, fields).await.map_err(|err| {
            if err.is_not_found() {
                TaskError::NotFound(id.clone())
            } else {
                TaskError::Store(err)
            }
        })?;
        debug!(task = %id, checked, "Updated completion flag");
        Ok(())
    }

    /// Soft-delete a task: copy it to the archive, then remove it.
    ///
    /// Archive entries are write-once: if one already exists under `id`, it is
    /// kept and only the removal runs. The two writes are not atomic. If the removal fails the task remains in
    /// both collections; calling this again finishes the move. A task that is
    /// already gone is a no-op.
    ///
    /// # Errors
    /// Returns [`TaskError::Store`] if any of the three store calls fails.
    pub async fn delete_task(&self, id: &TaskId) -> Result<DeleteOutcome, TaskError> {
        let source = self.task_path(id)?;
        let archive = self.archive_root.child(id.as_str())?;

        debug!(task = %id, phase = %ArchivePhase::Reading, "Deleting task");
        let Some(snapshot) = self.store.read_once(&source).await? else {
            debug!(task = %id, "Task already gone");
            return Ok(DeleteOutcome::AlreadyGone);
        };

        debug!(task = %id, phase = %ArchivePhase::Archiving, "Deleting task");
        if !self.store.create(&archive, snapshot).await? {
            debug!(task = %id, "Archive entry already present; keeping the first copy");
        }

        debug!(task = %id, phase = %ArchivePhase::Removing, "Deleting task");
        if let Err(err) = self.store.remove(&source).await {
            warn!(
                task = %id,
                error = %err,
                "Task archived but still active; retry the delete to finish"
            );
            return Err(err.into());
        }
        Ok(DeleteOutcome::Archived)
    }

    fn task_path(&self, id: &TaskId) -> Result<StorePath, TaskError> {
        Ok(self.tasks_root.child(id.as_str())?)
    }
}

impl<S> TaskRepository<S> {
    /// Observe the task collection. Fires after every snapshot or local edit.
    #[must_use]
    pub fn on_tasks_changed(&self) -> watch::Receiver<TaskCollection> {
        self.shared.tasks_tx.subscribe()
    }

    /// Observe the number of archived tasks.
    #[must_use]
    pub fn on_deleted_count_changed(&self) -> watch::Receiver<usize> {
        self.shared.deleted_tx.subscribe()
    }

    /// Observe the derived view model. Re-emitted after every collection or
    /// archive count change.
    #[must_use]
    pub fn view_models(&self) -> watch::Receiver<ViewModel> {
        self.shared.view_tx.subscribe()
    }

    /// Current task collection, including pending local edits.
    #[must_use]
    pub fn tasks(&self) -> TaskCollection {
        self.shared.lock().tasks.effective()
    }

    /// Current archive size.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.shared.lock().deleted_count
    }

    /// Current view model.
    #[must_use]
    pub fn view(&self) -> ViewModel {
        self.shared.view_tx.borrow().clone()
    }

    /// Look up a task in the current collection.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.shared.lock().tasks.effective().get(id).cloned()
    }

    /// Stop following the store. The cache keeps its last state.
    pub fn shutdown(&self) {
        for follower in &self.followers {
            follower.abort();
        }
        info!("Stopped task repository");
    }

    pub(crate) fn stage(&self, op: PendingOp) -> PendingToken {
        let mut state = self.shared.lock();
        let token = state.tasks.stage(op);
        self.shared.publish_tasks(&state);
        token
    }

    pub(crate) fn withdraw(&self, token: PendingToken) {
        let mut state = self.shared.lock();
        if state.tasks.withdraw(token) {
            self.shared.publish_tasks(&state);
        }
    }

    pub(crate) fn provisional_id(&self) -> TaskId {
        self.shared.lock().tasks.provisional_id()
    }
}

impl<S> Drop for TaskRepository<S> {
    fn drop(&mut self) {
        for follower in &self.followers {
            follower.abort();
        }
    }
}
