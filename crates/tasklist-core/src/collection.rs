//! Process-local mirror of the `tasks` subtree.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::id::{InvalidTaskId, TaskId};
use crate::task::{Task, TaskRecord};

/// Entry of a snapshot that could not be decoded into a [`Task`].
#[derive(Debug)]
pub struct MalformedEntry {
    /// Raw child key as delivered by the store.
    pub key: String,
    /// Why the entry was rejected.
    pub reason: MalformedReason,
}

/// Decoding failure for a single snapshot entry.
#[derive(Debug, thiserror::Error)]
pub enum MalformedReason {
    /// The child key is not a usable id.
    #[error("invalid key: {0}")]
    Key(#[from] InvalidTaskId),
    /// The child value does not have the `{text, isChecked}` shape.
    #[error("invalid record: {0}")]
    Record(#[from] serde_json::Error),
    /// The subtree root is not an object.
    #[error("snapshot root is not an object")]
    NotAnObject,
}

/// Mapping from task id to task, rebuilt wholesale from each snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskCollection {
    /// Decode a full `tasks` snapshot.
    ///
    /// An absent value is an empty collection. Entries that fail to decode are
    /// skipped and reported alongside the collection.
    #[must_use]
    pub fn from_snapshot(snapshot: Option<&Value>) -> (Self, Vec<MalformedEntry>) {
        let mut collection = Self::default();
        let mut malformed = Vec::new();

        let entries = match snapshot {
            None | Some(Value::Null) => return (collection, malformed),
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                malformed.push(MalformedEntry {
                    key: String::new(),
                    reason: MalformedReason::NotAnObject,
                });
                return (collection, malformed);
            }
        };

        for (key, value) in entries {
            let decoded = key
                .parse::<TaskId>()
                .map_err(MalformedReason::from)
                .and_then(|id| {
                    serde_json::from_value::<TaskRecord>(value.clone())
                        .map(|record| Task::from_record(id, record))
                        .map_err(MalformedReason::from)
                });
            match decoded {
                Ok(task) => {
                    collection.insert(task);
                }
                Err(reason) => malformed.push(MalformedEntry {
                    key: key.clone(),
                    reason,
                }),
            }
        }

        (collection, malformed)
    }

    /// Insert or replace a task, returning the previous value.
    pub fn insert(&mut self, task: Task) -> Option<Task> {
        self.tasks.insert(task.id.clone(), task)
    }

    /// Remove a task by id.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        self.tasks.remove(id)
    }

    /// Look up a task.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Mutable access to a task.
    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no task is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate tasks in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

impl FromIterator<Task> for TaskCollection {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().map(|task| (task.id.clone(), task)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn absent_snapshot_is_empty() {
        let (collection, malformed) = TaskCollection::from_snapshot(None);
        assert!(collection.is_empty());
        assert!(malformed.is_empty());

        let (collection, _) = TaskCollection::from_snapshot(Some(&Value::Null));
        assert!(collection.is_empty());
    }

    #[test]
    fn decodes_every_well_formed_entry() {
        let snapshot = json!({
            "a1": { "text": "first", "isChecked": false },
            "b2": { "text": "second", "isChecked": true },
        });
        let (collection, malformed) = TaskCollection::from_snapshot(Some(&snapshot));
        assert!(malformed.is_empty());
        assert_eq!(collection.len(), 2);
        let b2 = collection.get(&"b2".parse().unwrap()).unwrap();
        assert_eq!(b2.text, "second");
        assert!(b2.is_checked);
    }

    #[test]
    fn skips_malformed_entries() {
        let snapshot = json!({
            "good": { "text": "ok", "isChecked": false },
            "bad": { "text": 42 },
            "worse": "nope",
        });
        let (collection, malformed) = TaskCollection::from_snapshot(Some(&snapshot));
        assert_eq!(collection.len(), 1);
        let mut keys: Vec<_> = malformed.iter().map(|entry| entry.key.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["bad", "worse"]);
    }

    #[test]
    fn stored_key_with_provisional_prefix_is_skipped() {
        let snapshot = json!({
            "~local-000000000001": { "text": "imposter", "isChecked": false },
        });
        let (collection, malformed) = TaskCollection::from_snapshot(Some(&snapshot));
        assert!(collection.is_empty());
        assert!(matches!(
            malformed[0].reason,
            MalformedReason::Key(InvalidTaskId::Reserved(_))
        ));
    }

    #[test]
    fn non_object_root_is_reported() {
        let (collection, malformed) = TaskCollection::from_snapshot(Some(&json!([1, 2])));
        assert!(collection.is_empty());
        assert!(matches!(malformed[0].reason, MalformedReason::NotAnObject));
    }
}
