//! In-memory owner of people and occurrences.
//!
//! # Responsibility
//! - Apply create/update/delete with validation and person resolution.
//! - Replace all contents from decoded CSV rows.
//! - Answer filter/sort queries and aggregations.
//!
//! # Invariants
//! - Only this type mutates the person registry and occurrence list.
//! - Failed validation leaves the store untouched.

use crate::csv::codec::{encode, DecodedCsv};
use crate::identity::import::{reconcile, ImportReport};
use crate::identity::registry::PersonRegistry;
use crate::model::occurrence::{
    new_occurrence_id, now_timestamp, FieldError, InputField, InputValidationError, Occurrence,
    OccurrenceInput,
};
use crate::model::person::{Person, PersonId};
use crate::store::aggregate::{
    aggregate_by_person, daily_summary, AggregateScope, DailySummary, PersonTotal,
};
use crate::store::query::OccurrenceQuery;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(InputValidationError),
    NotFound(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "occurrence not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<InputValidationError> for StoreError {
    fn from(value: InputValidationError) -> Self {
        Self::Validation(value)
    }
}

/// People and occurrences for one open CSV document.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceStore {
    people: PersonRegistry,
    occurrences: Vec<Occurrence>,
}

impl OccurrenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all people and occurrences with the decoded document.
    pub fn import_rows(&mut self, decoded: &DecodedCsv) -> ImportReport {
        let reconciled = reconcile(decoded.schema, &decoded.rows);
        self.people = reconciled.registry;
        self.occurrences = reconciled.occurrences;

        let report = reconciled.report;
        if !report.conflicts.is_empty()
            || !report.skipped_lines.is_empty()
            || !report.duplicate_id_lines.is_empty()
        {
            warn!(
                "event=csv_import module=store status=conflicts conflicts={} skipped={} duplicate_ids={}",
                report.conflicts.len(),
                report.skipped_lines.len(),
                report.duplicate_id_lines.len()
            );
        }
        info!(
            "event=csv_import module=store status=ok schema={:?} occurrences={} people={}",
            report.schema, report.occurrence_count, report.people_count
        );
        report
    }

    /// Serializes every occurrence in canonical order.
    pub fn to_csv(&self) -> String {
        encode(&self.occurrences)
    }

    /// Validates `input`, resolves the person and appends a new occurrence.
    pub fn create_occurrence(&mut self, input: &OccurrenceInput) -> StoreResult<Occurrence> {
        let valid = input.to_valid()?;
        let person = self.resolve_person(&valid.person_name)?;
        let now = now_timestamp();

        let occurrence = Occurrence {
            occurrence_id: new_occurrence_id(),
            person_id: person.person_id,
            person_name: person.name,
            occurrence_type: valid.occurrence_type,
            date: valid.date,
            duration_minutes: valid.duration_minutes,
            created_at: now.clone(),
            updated_at: now,
        };
        self.occurrences.push(occurrence.clone());
        info!(
            "event=occurrence_create module=store status=ok occurrence_id={}",
            occurrence.occurrence_id
        );
        Ok(occurrence)
    }

    /// Replaces the editable fields of an existing occurrence and bumps `updated_at`.
    pub fn update_occurrence(
        &mut self,
        occurrence_id: &str,
        input: &OccurrenceInput,
    ) -> StoreResult<Occurrence> {
        let valid = input.to_valid()?;
        let index = self
            .position(occurrence_id)
            .ok_or_else(|| StoreError::NotFound(occurrence_id.to_string()))?;
        let person = self.resolve_person(&valid.person_name)?;

        let occurrence = &mut self.occurrences[index];
        occurrence.person_id = person.person_id;
        occurrence.person_name = person.name;
        occurrence.occurrence_type = valid.occurrence_type;
        occurrence.date = valid.date;
        occurrence.duration_minutes = valid.duration_minutes;
        occurrence.updated_at = now_timestamp();
        info!(
            "event=occurrence_update module=store status=ok occurrence_id={}",
            occurrence_id
        );
        Ok(occurrence.clone())
    }

    /// Removes one occurrence. Its person stays registered.
    pub fn delete_occurrence(&mut self, occurrence_id: &str) -> StoreResult<Occurrence> {
        let index = self
            .position(occurrence_id)
            .ok_or_else(|| StoreError::NotFound(occurrence_id.to_string()))?;
        let removed = self.occurrences.remove(index);
        info!(
            "event=occurrence_delete module=store status=ok occurrence_id={}",
            occurrence_id
        );
        Ok(removed)
    }

    pub fn get(&self, occurrence_id: &str) -> Option<&Occurrence> {
        self.occurrences
            .iter()
            .find(|item| item.occurrence_id == occurrence_id)
    }

    /// Occurrences in insertion order.
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn people(&self) -> &PersonRegistry {
        &self.people
    }

    pub fn person(&self, person_id: &PersonId) -> Option<&Person> {
        self.people.get(person_id)
    }

    /// ID a name would be stored under, without registering it.
    pub fn preview_person_id(&self, name: &str) -> PersonId {
        self.people.preview_person_id(name)
    }

    pub fn query(&self, query: &OccurrenceQuery) -> Vec<&Occurrence> {
        query.apply(&self.occurrences)
    }

    pub fn aggregate(&self, scope: &AggregateScope) -> Vec<PersonTotal> {
        aggregate_by_person(&self.occurrences, scope)
    }

    pub fn daily_summary(&self, date: &str) -> DailySummary {
        daily_summary(&self.occurrences, date)
    }

    fn position(&self, occurrence_id: &str) -> Option<usize> {
        self.occurrences
            .iter()
            .position(|item| item.occurrence_id == occurrence_id)
    }

    fn resolve_person(&mut self, name: &str) -> StoreResult<Person> {
        // Validated names are non-blank, so resolution only fails on a broken invariant.
        self.people.resolve(name).cloned().ok_or_else(|| {
            StoreError::Validation(InputValidationError {
                errors: vec![FieldError::Required(InputField::PersonName)],
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, date: &str, duration: &str) -> OccurrenceInput {
        OccurrenceInput {
            person_name: name.to_string(),
            occurrence_type: Some("Visita".to_string()),
            date: date.to_string(),
            duration: duration.to_string(),
        }
    }

    #[test]
    fn create_resolves_people_and_stamps_times() {
        let mut store = OccurrenceStore::new();
        let first = store
            .create_occurrence(&input("José", "2024-01-01", "1:30"))
            .unwrap();
        let second = store
            .create_occurrence(&input("jose ", "2024-01-02", "15"))
            .unwrap();

        assert_eq!(first.person_id.as_str(), "P0001");
        assert_eq!(second.person_id, first.person_id);
        assert_eq!(second.person_name, "jose");
        assert_eq!(first.duration_minutes, 90);
        assert_eq!(first.created_at, first.updated_at);
        assert_ne!(first.occurrence_id, second.occurrence_id);
        assert_eq!(store.people().len(), 1);
        assert_eq!(store.occurrences().len(), 2);
    }

    #[test]
    fn invalid_input_leaves_store_untouched() {
        let mut store = OccurrenceStore::new();
        let err = store
            .create_occurrence(&input("Ana", "2024-01-01", "0"))
            .unwrap_err();
        let StoreError::Validation(details) = err else {
            panic!("expected validation error");
        };
        assert!(matches!(
            details.for_field(InputField::Duration),
            Some(FieldError::Duration(_))
        ));
        assert!(store.occurrences().is_empty());
        assert!(store.people().is_empty());
    }

    #[test]
    fn update_replaces_fields_and_moves_updated_at() {
        let mut store = OccurrenceStore::new();
        let created = store
            .create_occurrence(&input("Ana", "2024-01-01", "30"))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));

        let updated = store
            .update_occurrence(&created.occurrence_id, &input("Bia", "2024-01-05", "2h"))
            .unwrap();
        assert_eq!(updated.person_id.as_str(), "P0002");
        assert_eq!(updated.duration_minutes, 120);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(store.get(&created.occurrence_id), Some(&updated));
    }

    #[test]
    fn unknown_ids_report_not_found() {
        let mut store = OccurrenceStore::new();
        assert_eq!(
            store.delete_occurrence("nope"),
            Err(StoreError::NotFound("nope".to_string()))
        );
        assert_eq!(
            store
                .update_occurrence("nope", &input("Ana", "2024-01-01", "30"))
                .unwrap_err(),
            StoreError::NotFound("nope".to_string())
        );
        assert!(store.people().is_empty());
    }

    #[test]
    fn delete_keeps_person_registered() {
        let mut store = OccurrenceStore::new();
        let created = store
            .create_occurrence(&input("Ana", "2024-01-01", "30"))
            .unwrap();
        store.delete_occurrence(&created.occurrence_id).unwrap();
        assert!(store.occurrences().is_empty());
        assert_eq!(store.preview_person_id("ana").as_str(), "P0001");
    }
}
