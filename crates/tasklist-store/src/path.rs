//! Slash-delimited addresses into the store tree.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

const FORBIDDEN: &[char] = &['.', '$', '#', '[', ']'];

/// Validated path such as `tasks/abc123`.
///
/// The empty path (`""` or `"/"`) addresses the root of the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Root of the tree.
    #[must_use]
    pub const fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Parse a slash-delimited path. Leading and trailing slashes are ignored.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidPath`] for empty inner segments or reserved characters.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut path = Self::root();
        for segment in trimmed.split('/') {
            path = path.child(segment).map_err(|err| match err {
                StoreError::InvalidPath { reason, .. } => StoreError::InvalidPath {
                    path: raw.to_owned(),
                    reason,
                },
                other => other,
            })?;
        }
        Ok(path)
    }

    /// Append one segment.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidPath`] if the segment is empty, contains `/`,
    /// or contains one of `. $ # [ ]`.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        let invalid = |reason| StoreError::InvalidPath {
            path: format!("{self}/{segment}"),
            reason,
        };
        if segment.is_empty() {
            return Err(invalid("empty segment"));
        }
        if segment.contains('/') {
            return Err(invalid("segment contains '/'"));
        }
        if segment.contains(FORBIDDEN) || segment.chars().any(char::is_control) {
            return Err(invalid("segment contains a reserved character"));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Ok(Self { segments })
    }

    /// Path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` for the root.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// True for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `self` equals `other` or lies above it.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True when one path lies on the other's branch, so a change to one can
    /// alter the value seen at the other.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for StorePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
