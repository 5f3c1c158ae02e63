//! Occurrence record and user input validation.
//!
//! # Invariants
//! - `occurrence_id` is never reused for another record.
//! - `created_at` is set once; `updated_at` moves on every edit.
//! - Timestamps are ISO-8601 UTC with millisecond precision, so lexicographic
//!   order equals chronological order.

use crate::model::duration::{parse_duration, DurationError};
use crate::model::person::PersonId;
use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable occurrence identifier (UUID text for new records, verbatim for imports).
pub type OccurrenceId = String;

/// Type label used when a record carries no type (legacy CSV, blank input).
pub const DEFAULT_OCCURRENCE_TYPE: &str = "Não informado";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One dated record linking a person to a duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub occurrence_id: OccurrenceId,
    pub person_id: PersonId,
    /// Person display name at write time.
    pub person_name: String,
    pub occurrence_type: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub duration_minutes: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Generates a fresh occurrence identifier.
pub fn new_occurrence_id() -> OccurrenceId {
    Uuid::new_v4().to_string()
}

/// Current UTC time in the persisted timestamp format.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Raw form input for creating or editing an occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceInput {
    pub person_name: String,
    /// Blank or `None` falls back to `DEFAULT_OCCURRENCE_TYPE`.
    pub occurrence_type: Option<String>,
    pub date: String,
    /// Free-form duration text, see `parse_duration`.
    pub duration: String,
}

/// Input field a validation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    PersonName,
    Date,
    Duration,
}

impl Display for InputField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonName => write!(f, "person_name"),
            Self::Date => write!(f, "date"),
            Self::Duration => write!(f, "duration"),
        }
    }
}

/// One failed field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required(InputField),
    InvalidDate(String),
    Duration(DurationError),
}

impl FieldError {
    pub fn field(&self) -> InputField {
        match self {
            Self::Required(field) => *field,
            Self::InvalidDate(_) => InputField::Date,
            Self::Duration(_) => InputField::Duration,
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{field} is required"),
            Self::InvalidDate(value) => write!(f, "date `{value}` must use YYYY-MM-DD"),
            Self::Duration(err) => write!(f, "{err}"),
        }
    }
}

/// All field failures found in one `OccurrenceInput`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValidationError {
    pub errors: Vec<FieldError>,
}

impl InputValidationError {
    /// Failure for `field`, if that field was rejected.
    pub fn for_field(&self, field: InputField) -> Option<&FieldError> {
        self.errors.iter().find(|err| err.field() == field)
    }
}

impl Display for InputValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "invalid occurrence: {}", messages.join("; "))
    }
}

impl Error for InputValidationError {}

/// Input that passed every field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidInput {
    pub person_name: String,
    pub occurrence_type: String,
    pub date: String,
    pub duration_minutes: u32,
}

impl OccurrenceInput {
    /// Checks every field and reports all failures at once.
    pub fn validate(&self) -> Result<(), InputValidationError> {
        self.to_valid().map(|_| ())
    }

    pub(crate) fn to_valid(&self) -> Result<ValidInput, InputValidationError> {
        let mut errors = Vec::new();

        let person_name = self.person_name.trim();
        if person_name.is_empty() {
            errors.push(FieldError::Required(InputField::PersonName));
        }

        let date = self.date.trim();
        if date.is_empty() {
            errors.push(FieldError::Required(InputField::Date));
        } else if NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() || date.len() != 10 {
            errors.push(FieldError::InvalidDate(date.to_string()));
        }

        let duration_minutes = match parse_duration(&self.duration) {
            Ok(minutes) => minutes,
            Err(err) => {
                errors.push(FieldError::Duration(err));
                0
            }
        };

        if !errors.is_empty() {
            return Err(InputValidationError { errors });
        }

        let occurrence_type = self
            .occurrence_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_OCCURRENCE_TYPE)
            .to_string();

        Ok(ValidInput {
            person_name: person_name.to_string(),
            occurrence_type,
            date: date.to_string(),
            duration_minutes,
        })
    }
}
