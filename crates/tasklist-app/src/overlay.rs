//! Confirmed snapshot plus short-lived optimistic edits.

use tasklist_core::{Task, TaskCollection, TaskId};

/// Local edit applied ahead of the store's acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOp {
    /// Show a task that the store has not yet echoed back.
    Insert(Task),
    /// Show a completion flag change.
    SetChecked {
        /// Target task.
        id: TaskId,
        /// New flag value.
        checked: bool,
    },
    /// Hide a task that is being archived.
    Remove(TaskId),
}

impl PendingOp {
    fn apply(&self, tasks: &mut TaskCollection) {
        match self {
            Self::Insert(task) => {
                tasks.insert(task.clone());
            }
            Self::SetChecked { id, checked } => {
                if let Some(task) = tasks.get_mut(id) {
                    task.is_checked = *checked;
                }
            }
            Self::Remove(id) => {
                tasks.remove(id);
            }
        }
    }
}

/// Handle used to withdraw a pending edit whose store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingToken(u64);

/// Last authoritative snapshot and the edits layered on top of it.
///
/// A new snapshot always wins: it replaces the confirmed collection and drops
/// every pending edit, so overlay entries are overwritten, never merged.
#[derive(Debug, Default)]
pub struct SyncedTasks {
    confirmed: TaskCollection,
    pending: Vec<(PendingToken, PendingOp)>,
    next_token: u64,
    next_provisional: u64,
}

impl SyncedTasks {
    /// Replace the confirmed collection, returning how many edits it superseded.
    pub fn confirm(&mut self, snapshot: TaskCollection) -> usize {
        self.confirmed = snapshot;
        let superseded = self.pending.len();
        self.pending.clear();
        superseded
    }

    /// Layer an edit on top of the confirmed collection.
    pub fn stage(&mut self, op: PendingOp) -> PendingToken {
        self.next_token += 1;
        let token = PendingToken(self.next_token);
        self.pending.push((token, op));
        token
    }

    /// Drop a pending edit. Returns false if a snapshot already superseded it.
    pub fn withdraw(&mut self, token: PendingToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(candidate, _)| *candidate != token);
        self.pending.len() != before
    }

    /// Fresh id for an optimistic insert. Never reused within a session.
    pub fn provisional_id(&mut self) -> TaskId {
        self.next_provisional += 1;
        TaskId::provisional(self.next_provisional)
    }

    /// True when no edit is outstanding.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.pending.is_empty()
    }

    /// Last authoritative snapshot.
    #[must_use]
    pub const fn confirmed(&self) -> &TaskCollection {
        &self.confirmed
    }

    /// Confirmed collection with pending edits applied in order.
    #[must_use]
    pub fn effective(&self) -> TaskCollection {
        let mut tasks = self.confirmed.clone();
        for (_, op) in &self.pending {
            op.apply(&mut tasks);
        }
        tasks
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn task(id: &str, checked: bool) -> Task {
        Task {
            id: id.parse().unwrap(),
            text: format!("task {id}"),
            is_checked: checked,
        }
    }

    fn id(raw: &str) -> TaskId {
        raw.parse().unwrap()
    }

    #[test]
    fn pending_edits_apply_in_order() {
        let mut synced = SyncedTasks::default();
        synced.confirm([task("a", false), task("b", false)].into_iter().collect());

        synced.stage(PendingOp::SetChecked {
            id: id("a"),
            checked: true,
        });
        synced.stage(PendingOp::Remove(id("b")));
        let pending = synced.provisional_id();
        synced.stage(PendingOp::Insert(Task {
            id: pending.clone(),
            text: "new".into(),
            is_checked: false,
        }));

        let effective = synced.effective();
        assert!(effective.get(&id("a")).unwrap().is_checked);
        assert!(effective.get(&id("b")).is_none());
        assert!(effective.get(&pending).is_some());
        assert!(!synced.confirmed().get(&id("a")).unwrap().is_checked);
    }

    #[test]
    fn snapshot_supersedes_every_pending_edit() {
        let mut synced = SyncedTasks::default();
        synced.stage(PendingOp::Insert(task("local", false)));
        synced.stage(PendingOp::Remove(id("x")));
        assert!(!synced.is_confirmed());

        let superseded = synced.confirm([task("a", true)].into_iter().collect());
        assert_eq!(superseded, 2);
        assert!(synced.is_confirmed());
        assert_eq!(synced.effective(), synced.confirmed().clone());
    }

    #[test]
    fn withdraw_removes_only_its_own_edit() {
        let mut synced = SyncedTasks::default();
        synced.confirm([task("a", false)].into_iter().collect());
        let first = synced.stage(PendingOp::SetChecked {
            id: id("a"),
            checked: true,
        });
        let second = synced.stage(PendingOp::Insert(task("b", false)));

        assert!(synced.withdraw(first));
        assert!(!synced.withdraw(first));
        let effective = synced.effective();
        assert!(!effective.get(&id("a")).unwrap().is_checked);
        assert!(effective.get(&id("b")).is_some());

        synced.confirm(TaskCollection::default());
        assert!(!synced.withdraw(second));
    }

    #[test]
    fn set_checked_on_unknown_task_is_a_no_op() {
        let mut synced = SyncedTasks::default();
        synced.stage(PendingOp::SetChecked {
            id: id("ghost"),
            checked: true,
        });
        assert!(synced.effective().is_empty());
    }

    #[test]
    fn provisional_ids_are_unique() {
        let mut synced = SyncedTasks::default();
        let first = synced.provisional_id();
        synced.confirm(TaskCollection::default());
        let second = synced.provisional_id();
        assert_ne!(first, second);
        assert!(first.is_provisional() && second.is_provisional());
    }
}
