use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::TaskId;

/// Task text was empty once surrounding whitespace was trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task text must not be empty")]
pub struct EmptyTaskText;

/// Trimmed, non-empty task text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskText(String);

impl TaskText {
    /// Trim raw input and reject it when nothing remains.
    ///
    /// # Errors
    /// Returns [`EmptyTaskText`] for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, EmptyTaskText> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyTaskText);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored shape of a task under `tasks/{id}` and `deletedTasks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Task text, immutable after creation.
    pub text: String,
    /// Completion flag.
    pub is_checked: bool,
}

impl TaskRecord {
    /// Stored name of the completion flag, the only mutable field.
    pub const CHECKED_FIELD: &'static str = "isChecked";

    /// Record for a freshly created, unchecked task.
    #[must_use]
    pub fn new(text: TaskText) -> Self {
        Self {
            text: text.into_inner(),
            is_checked: false,
        }
    }
}

/// A task as seen by readers: its store key plus the record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Task text.
    pub text: String,
    /// Completion flag.
    pub is_checked: bool,
}

impl Task {
    /// Attach an id to a stored record.
    #[must_use]
    pub fn from_record(id: TaskId, record: TaskRecord) -> Self {
        Self {
            id,
            text: record.text,
            is_checked: record.is_checked,
        }
    }

    /// Stored shape of this task, without the id.
    #[must_use]
    pub fn record(&self) -> TaskRecord {
        TaskRecord {
            text: self.text.clone(),
            is_checked: self.is_checked,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let text = TaskText::parse("  buy milk \n").expect("non-empty");
        assert_eq!(text.as_str(), "buy milk");
    }

    #[test]
    fn parse_rejects_blank_input() {
        assert_eq!(TaskText::parse(""), Err(EmptyTaskText));
        assert_eq!(TaskText::parse(" \t\n "), Err(EmptyTaskText));
    }

    #[test]
    fn new_record_starts_unchecked() {
        let record = TaskRecord::new(TaskText::parse("write report").unwrap());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "text": "write report", "isChecked": false })
        );
    }

    #[test]
    fn record_reads_store_shape() {
        let record: TaskRecord =
            serde_json::from_value(json!({ "text": "call mom", "isChecked": true })).unwrap();
        let task = Task::from_record("k1".parse().unwrap(), record.clone());
        assert!(task.is_checked);
        assert_eq!(task.record(), record);
    }
}
