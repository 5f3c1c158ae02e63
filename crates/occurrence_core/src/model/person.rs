//! Person identity model.
//!
//! # Invariants
//! - Generated IDs follow `P####` (zero-padded, at least four digits).
//! - Imported IDs are kept verbatim even when they do not follow the pattern.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const PERSON_ID_PREFIX: char = 'P';
const PERSON_ID_WIDTH: usize = 4;

/// Stable person identifier, e.g. `P0007`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Wraps an existing identifier without validating its shape.
    ///
    /// Used by import paths where identity comes from CSV content.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds the canonical `P####` form for a sequence number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!(
            "{PERSON_ID_PREFIX}{sequence:0width$}",
            width = PERSON_ID_WIDTH
        ))
    }

    /// Numeric part used for next-ID allocation.
    ///
    /// Accepts `P<digits>` with either prefix case, or bare digits. Anything
    /// else, including suffixes too large for `u64`, does not take part in
    /// sequencing.
    pub fn sequence(&self) -> Option<u64> {
        let digits = self
            .0
            .strip_prefix(['P', 'p'])
            .unwrap_or(self.0.as_str());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A deduplicated person known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: PersonId,
    /// Latest display spelling seen for this person.
    pub name: String,
    /// Dedup key derived by `normalize_name`.
    pub normalized_name: String,
}
