//! Identity reconciliation for imported CSV rows.
//!
//! # Invariants
//! - The first row that binds a normalized name fixes its person ID.
//! - The first name bound to a stated ID keeps that ID; later, different
//!   names under the same ID receive freshly allocated IDs.
//! - Every deviation from the stated IDs is reported as an `ImportConflict`.

use crate::csv::schema::{DecodedRow, HeaderSchema};
use crate::identity::normalize::normalize_name;
use crate::identity::registry::PersonRegistry;
use crate::model::occurrence::Occurrence;
use crate::model::person::PersonId;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// Identity inconsistency found while importing. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportConflict {
    /// The name was already bound to `existing_id` by an earlier row.
    NameBoundToOtherId {
        line: usize,
        stated_id: PersonId,
        existing_id: PersonId,
        name: String,
    },
    /// `person_id` was already used by an earlier row for a different name.
    IdReusedAcrossNames {
        line: usize,
        person_id: PersonId,
        existing_name: String,
        name: String,
        assigned_id: PersonId,
    },
}

impl ImportConflict {
    pub fn line(&self) -> usize {
        match self {
            Self::NameBoundToOtherId { line, .. } | Self::IdReusedAcrossNames { line, .. } => {
                *line
            }
        }
    }

    /// ID the conflicting row was stored under.
    pub fn assigned_id(&self) -> &PersonId {
        match self {
            Self::NameBoundToOtherId { existing_id, .. } => existing_id,
            Self::IdReusedAcrossNames { assigned_id, .. } => assigned_id,
        }
    }
}

impl Display for ImportConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameBoundToOtherId {
                line,
                stated_id,
                existing_id,
                name,
            } => write!(
                f,
                "line {line}: `{name}` is listed as {stated_id} but was already imported as {existing_id}; kept {existing_id}"
            ),
            Self::IdReusedAcrossNames {
                line,
                person_id,
                existing_name,
                name,
                assigned_id,
            } => write!(
                f,
                "line {line}: {person_id} is used for both `{existing_name}` and `{name}`; `{name}` was assigned {assigned_id}"
            ),
        }
    }
}

/// Summary of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    #[serde(skip)]
    pub schema: HeaderSchema,
    pub occurrence_count: usize,
    pub people_count: usize,
    pub conflicts: Vec<ImportConflict>,
    /// Lines dropped for a blank name or date.
    pub skipped_lines: Vec<usize>,
    /// Lines whose occurrence ID already appeared earlier in the document.
    ///
    /// Such rows are still imported; edits and deletes by ID reach the first one.
    pub duplicate_id_lines: Vec<usize>,
}

/// Rebuilt store contents plus the report.
pub(crate) struct Reconciled {
    pub registry: PersonRegistry,
    pub occurrences: Vec<Occurrence>,
    pub report: ImportReport,
}

/// Rebuilds people and occurrences from scratch out of decoded rows.
pub(crate) fn reconcile(schema: HeaderSchema, rows: &[DecodedRow]) -> Reconciled {
    let mut registry = PersonRegistry::new();
    let mut occurrences = Vec::with_capacity(rows.len());
    let mut conflicts = Vec::new();
    let mut skipped_lines = Vec::new();
    let mut duplicate_id_lines = Vec::new();
    let mut seen_ids = HashSet::new();

    for row in rows {
        let name = row.person_name().trim();
        let normalized = normalize_name(name);
        if normalized.is_empty() || row.date().trim().is_empty() {
            skipped_lines.push(row.line());
            continue;
        }

        let stated = row.person_id().trim();
        let person_id = effective_person_id(&registry, row.line(), stated, name, &normalized)
            .unwrap_or_else(|conflict| {
                let assigned = conflict.assigned_id().clone();
                conflicts.push(conflict);
                assigned
            });

        registry.bind(person_id.clone(), name, normalized);
        let occurrence = row.to_occurrence(person_id);
        if !seen_ids.insert(occurrence.occurrence_id.clone()) {
            duplicate_id_lines.push(row.line());
        }
        occurrences.push(occurrence);
    }

    let report = ImportReport {
        schema,
        occurrence_count: occurrences.len(),
        people_count: registry.len(),
        conflicts,
        skipped_lines,
        duplicate_id_lines,
    };

    Reconciled {
        registry,
        occurrences,
        report,
    }
}

/// Picks the ID a row is stored under; `Err` carries the ID used anyway.
fn effective_person_id(
    registry: &PersonRegistry,
    line: usize,
    stated: &str,
    name: &str,
    normalized: &str,
) -> Result<PersonId, ImportConflict> {
    if let Some(existing_id) = registry.id_for_normalized(normalized) {
        if !stated.is_empty() && stated != existing_id.as_str() {
            return Err(ImportConflict::NameBoundToOtherId {
                line,
                stated_id: PersonId::new(stated),
                existing_id: existing_id.clone(),
                name: name.to_string(),
            });
        }
        return Ok(existing_id.clone());
    }

    if stated.is_empty() {
        return Ok(registry.next_person_id());
    }

    let stated_id = PersonId::new(stated);
    match registry.get(&stated_id) {
        Some(owner) if owner.normalized_name != normalized => {
            Err(ImportConflict::IdReusedAcrossNames {
                line,
                person_id: stated_id,
                existing_name: owner.name.clone(),
                name: name.to_string(),
                assigned_id: registry.next_person_id(),
            })
        }
        _ => Ok(stated_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::codec::decode;

    fn rows(body: &str) -> Vec<DecodedRow> {
        let text = format!("{}\n{body}", HeaderSchema::Current.header_line());
        decode(&text).unwrap().rows
    }

    #[test]
    fn same_name_with_different_ids_keeps_first_id() {
        let rows = rows(
            "o1,P0001,José Silva,Visita,2024-01-01,30,t1,t1\n\
             o2,P0009,jose  silva,Visita,2024-01-02,20,t2,t2",
        );
        let out = reconcile(HeaderSchema::Current, &rows);

        assert_eq!(out.registry.len(), 1);
        assert!(out
            .occurrences
            .iter()
            .all(|o| o.person_id.as_str() == "P0001"));
        assert_eq!(out.report.conflicts.len(), 1);
        let message = out.report.conflicts[0].to_string();
        assert!(message.contains("P0001") && message.contains("P0009"));
        assert_eq!(out.report.conflicts[0].line(), 3);
    }

    #[test]
    fn reused_id_for_a_different_name_gets_a_new_id() {
        let rows = rows(
            "o1,P0001,Ana,Visita,2024-01-01,30,t1,t1\n\
             o2,P0001,Bruno,Visita,2024-01-01,30,t2,t2\n\
             o3,P0001,Bruno,Visita,2024-01-03,30,t3,t3",
        );
        let out = reconcile(HeaderSchema::Current, &rows);

        assert_eq!(out.registry.len(), 2);
        assert_eq!(
            out.registry.get(&PersonId::new("P0001")).unwrap().name,
            "Ana"
        );
        let bruno = out.registry.find_by_name("bruno").unwrap();
        assert_eq!(bruno.person_id, PersonId::new("P0002"));
        assert!(matches!(
            out.report.conflicts[0],
            ImportConflict::IdReusedAcrossNames { line: 3, .. }
        ));
        // Third row: name already bound to P0002, stated P0001 differs.
        assert!(matches!(
            out.report.conflicts[1],
            ImportConflict::NameBoundToOtherId { line: 4, .. }
        ));
        assert_eq!(out.occurrences[2].person_id, PersonId::new("P0002"));
    }

    #[test]
    fn blank_names_and_dates_are_skipped_and_blank_ids_allocated() {
        let rows = rows(
            "o1,,Ana,Visita,2024-01-01,30,t1,t1\n\
             o2,P0005,   ,Visita,2024-01-01,30,t2,t2\n\
             o3,P0006,Caio,Visita,,30,t3,t3",
        );
        let out = reconcile(HeaderSchema::Current, &rows);

        assert_eq!(out.report.skipped_lines, vec![3, 4]);
        assert_eq!(out.occurrences.len(), 1);
        assert_eq!(out.occurrences[0].person_id, PersonId::new("P0001"));
        assert!(out.report.conflicts.is_empty());
    }

    #[test]
    fn repeated_occurrence_ids_are_kept_and_reported() {
        let rows = rows(
            "o1,P0001,Ana,Visita,2024-01-01,30,t1,t1\n\
             o2,P0001,Ana,Visita,2024-01-02,30,t2,t2\n\
             o1,P0001,Ana,Ligação,2024-01-03,45,t3,t3",
        );
        let out = reconcile(HeaderSchema::Current, &rows);

        assert_eq!(out.occurrences.len(), 3);
        assert_eq!(out.report.duplicate_id_lines, vec![4]);
        assert!(out.report.conflicts.is_empty());
    }

    #[test]
    fn latest_spelling_wins_for_display_name() {
        let rows = rows(
            "o1,P0001,jose,Visita,2024-01-01,30,t1,t1\n\
             o2,P0001,José,Visita,2024-01-02,30,t2,t2",
        );
        let out = reconcile(HeaderSchema::Current, &rows);
        assert_eq!(out.registry.get(&PersonId::new("P0001")).unwrap().name, "José");
        assert_eq!(out.occurrences[0].person_name, "jose");
    }
}
