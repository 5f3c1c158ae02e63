//! Known CSV header versions and their row layouts.

use crate::model::occurrence::{Occurrence, DEFAULT_OCCURRENCE_TYPE};
use crate::model::person::PersonId;

const CURRENT_COLUMNS: &[&str] = &[
    "occurrenceId",
    "personId",
    "personName",
    "occurrenceType",
    "date",
    "durationMinutes",
    "createdAt",
    "updatedAt",
];

const LEGACY_COLUMNS: &[&str] = &[
    "occurrenceId",
    "personId",
    "personName",
    "date",
    "durationMinutes",
    "createdAt",
    "updatedAt",
];

/// Registered header schemas, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSchema {
    /// 8 columns including `occurrenceType`. Always used for encoding.
    Current,
    /// 7 columns without `occurrenceType`. Decode only.
    Legacy,
}

impl HeaderSchema {
    const ALL: [HeaderSchema; 2] = [HeaderSchema::Current, HeaderSchema::Legacy];

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Current => CURRENT_COLUMNS,
            Self::Legacy => LEGACY_COLUMNS,
        }
    }

    /// Header line as written by the encoder.
    pub fn header_line(self) -> String {
        self.columns().join(",")
    }

    /// Matches trimmed header cells, in order, against every registered schema.
    pub fn detect(header: &[String]) -> Option<Self> {
        Self::ALL.into_iter().find(|schema| {
            let columns = schema.columns();
            columns.len() == header.len()
                && columns
                    .iter()
                    .zip(header)
                    .all(|(expected, actual)| *expected == actual.trim())
        })
    }

    pub(crate) fn row(self, line: usize, fields: Fields) -> DecodedRow {
        match self {
            Self::Current => DecodedRow::Current(CurrentRow {
                line,
                occurrence_id: fields.get(0),
                person_id: fields.get(1),
                person_name: fields.get(2),
                occurrence_type: fields.get(3),
                date: fields.get(4),
                duration_minutes: fields.get(5),
                created_at: fields.get(6),
                updated_at: fields.get(7),
            }),
            Self::Legacy => DecodedRow::Legacy(LegacyRow {
                line,
                occurrence_id: fields.get(0),
                person_id: fields.get(1),
                person_name: fields.get(2),
                date: fields.get(3),
                duration_minutes: fields.get(4),
                created_at: fields.get(5),
                updated_at: fields.get(6),
            }),
        }
    }
}

/// Raw tokenized row; missing trailing cells read as empty.
pub(crate) struct Fields(pub Vec<String>);

impl Fields {
    fn get(&self, index: usize) -> String {
        self.0.get(index).cloned().unwrap_or_default()
    }
}

/// Row in the 8-column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRow {
    /// 1-based line of the row in the token stream (header is line 1).
    pub line: usize,
    pub occurrence_id: String,
    pub person_id: String,
    pub person_name: String,
    pub occurrence_type: String,
    pub date: String,
    pub duration_minutes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Row in the 7-column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRow {
    pub line: usize,
    pub occurrence_id: String,
    pub person_id: String,
    pub person_name: String,
    pub date: String,
    pub duration_minutes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A decoded data row tagged with the schema it was read under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRow {
    Current(CurrentRow),
    Legacy(LegacyRow),
}

macro_rules! shared_field {
    ($name:ident) => {
        pub fn $name(&self) -> &str {
            match self {
                Self::Current(row) => &row.$name,
                Self::Legacy(row) => &row.$name,
            }
        }
    };
}

impl DecodedRow {
    shared_field!(occurrence_id);
    shared_field!(person_id);
    shared_field!(person_name);
    shared_field!(date);
    shared_field!(created_at);
    shared_field!(updated_at);

    pub fn line(&self) -> usize {
        match self {
            Self::Current(row) => row.line,
            Self::Legacy(row) => row.line,
        }
    }

    pub fn schema(&self) -> HeaderSchema {
        match self {
            Self::Current(_) => HeaderSchema::Current,
            Self::Legacy(_) => HeaderSchema::Legacy,
        }
    }

    /// Type label; legacy rows and blank cells report the default.
    pub fn occurrence_type(&self) -> &str {
        match self {
            Self::Current(row) if !row.occurrence_type.trim().is_empty() => &row.occurrence_type,
            _ => DEFAULT_OCCURRENCE_TYPE,
        }
    }

    /// Duration cell as minutes; anything but a plain non-negative integer reads as `0`.
    pub fn duration_minutes(&self) -> u32 {
        let raw = match self {
            Self::Current(row) => &row.duration_minutes,
            Self::Legacy(row) => &row.duration_minutes,
        };
        raw.trim().parse().unwrap_or(0)
    }

    /// Builds the occurrence under the given effective person ID.
    pub fn to_occurrence(&self, person_id: PersonId) -> Occurrence {
        Occurrence {
            occurrence_id: self.occurrence_id().to_string(),
            person_id,
            person_name: self.person_name().trim().to_string(),
            occurrence_type: self.occurrence_type().to_string(),
            date: self.date().trim().to_string(),
            duration_minutes: self.duration_minutes(),
            created_at: self.created_at().to_string(),
            updated_at: self.updated_at().to_string(),
        }
    }

    pub(crate) fn backfill(&mut self, fresh_id: impl FnOnce() -> String, now: &str) {
        let (occurrence_id, created_at, updated_at) = match self {
            Self::Current(row) => (
                &mut row.occurrence_id,
                &mut row.created_at,
                &mut row.updated_at,
            ),
            Self::Legacy(row) => (
                &mut row.occurrence_id,
                &mut row.created_at,
                &mut row.updated_at,
            ),
        };
        if occurrence_id.is_empty() {
            *occurrence_id = fresh_id();
        }
        if created_at.is_empty() {
            *created_at = now.to_string();
        }
        if updated_at.is_empty() {
            *updated_at = now.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn detects_both_schemas_with_trimmed_cells() {
        assert_eq!(
            HeaderSchema::detect(&cells(CURRENT_COLUMNS)),
            Some(HeaderSchema::Current)
        );
        let mut legacy = cells(LEGACY_COLUMNS);
        legacy[0] = " occurrenceId ".to_string();
        assert_eq!(HeaderSchema::detect(&legacy), Some(HeaderSchema::Legacy));
    }

    #[test]
    fn rejects_reordered_or_partial_headers() {
        let mut reordered = cells(CURRENT_COLUMNS);
        reordered.swap(0, 1);
        assert_eq!(HeaderSchema::detect(&reordered), None);
        assert_eq!(HeaderSchema::detect(&cells(&["occurrenceId"])), None);
    }

    #[test]
    fn legacy_rows_report_default_type() {
        let row = HeaderSchema::Legacy.row(
            2,
            Fields(cells(&["o1", "P0001", "Ana", "2024-01-01", "30", "t", "t"])),
        );
        assert_eq!(row.occurrence_type(), DEFAULT_OCCURRENCE_TYPE);
        assert_eq!(row.duration_minutes(), 30);
        assert_eq!(row.date(), "2024-01-01");
    }

    #[test]
    fn short_rows_and_bad_durations_read_as_empty_and_zero() {
        let row = HeaderSchema::Current.row(3, Fields(cells(&["o1", "P0001", "Ana"])));
        assert_eq!(row.date(), "");
        assert_eq!(row.duration_minutes(), 0);
        assert_eq!(row.occurrence_type(), DEFAULT_OCCURRENCE_TYPE);
    }
}
