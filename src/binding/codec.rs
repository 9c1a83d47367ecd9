//! # Referenced-Set Codec
//!
//! Encodes a set of owner keys into a single comma-separated metadata value.
//!
//! The encoding does not escape the delimiter. Callers must never store keys
//! containing it. Values written by other actors are tolerated: empty segments
//! are dropped and any other segment is kept as an opaque entry.

use crate::constants::REFERENCED_SET_DELIMITER;
use std::fmt;

/// Deduplicated, insertion-ordered set of strings stored as one delimited value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedSet {
    entries: Vec<String>,
}

impl ReferencedSet {
    /// Decode a stored value
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut set = Self::default();
        for segment in value.split(REFERENCED_SET_DELIMITER) {
            let segment = segment.trim();
            if !segment.is_empty() {
                set.add(segment);
            }
        }
        set
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.entries.iter().any(|e| e == value)
    }

    /// Add a value, returning `false` if it was already present
    pub fn add(&mut self, value: &str) -> bool {
        if self.contains(value) {
            return false;
        }
        self.entries.push(value.to_string());
        true
    }

    /// Remove a value, returning `false` if it was not present
    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != value);
        before != self.entries.len()
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ReferencedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "{REFERENCED_SET_DELIMITER}")?;
            }
            f.write_str(entry)?;
        }
        Ok(())
    }
}
