use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Prefix reserved for ids minted locally before the store assigns a real key.
///
/// `~` sorts after every ASCII letter and digit, so provisional tasks order
/// as the most recent entries under reverse-lexicographic comparison.
const PROVISIONAL_PREFIX: &str = "~local-";

/// Opaque identifier of a task, assigned by the store on creation.
///
/// Ordering is plain lexicographic comparison of the underlying string.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TaskId(String);

impl TaskId {
    /// Provisional id used by an optimistic insert awaiting its store key.
    #[must_use]
    pub fn provisional(seq: u64) -> Self {
        Self(format!("{PROVISIONAL_PREFIX}{seq:012}"))
    }

    /// Returns true when the id was minted locally and is unknown to the store.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    /// Borrow the raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reasons a string cannot serve as a [`TaskId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTaskId {
    /// Empty input.
    #[error("task id must not be empty")]
    Empty,
    /// Input would address a nested path or a reserved key.
    #[error("task id '{0}' contains a forbidden character")]
    ForbiddenChar(String),
    /// Input uses the prefix reserved for provisional ids.
    #[error("task id '{0}' uses the reserved provisional prefix")]
    Reserved(String),
}

impl FromStr for TaskId {
    type Err = InvalidTaskId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(InvalidTaskId::Empty);
        }
        if s.chars().any(|c| matches!(c, '/' | '.' | '$' | '#' | '[' | ']') || c.is_control()) {
            return Err(InvalidTaskId::ForbiddenChar(s.to_owned()));
        }
        if s.starts_with(PROVISIONAL_PREFIX) {
            return Err(InvalidTaskId::Reserved(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
