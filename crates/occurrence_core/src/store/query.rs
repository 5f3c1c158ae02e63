//! Filter and sort options for listing occurrences.

use crate::identity::normalize::normalize_name;
use crate::model::occurrence::Occurrence;
use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ordering applied to query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// `date` desc, then `created_at` desc.
    #[default]
    DateDesc,
    /// `duration_minutes` desc, then the `DateDesc` order.
    DurationDesc,
}

/// Query options; every set filter must match (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceQuery {
    pub person_id: Option<PersonId>,
    pub occurrence_type: Option<String>,
    /// Substring match on the normalized person name. Blank means no filter.
    pub person_search: Option<String>,
    /// Exact `YYYY-MM-DD` match.
    pub date: Option<String>,
    pub sort: SortMode,
}

impl OccurrenceQuery {
    /// Returns matching occurrences in the requested order.
    pub fn apply<'a, I>(&self, occurrences: I) -> Vec<&'a Occurrence>
    where
        I: IntoIterator<Item = &'a Occurrence>,
    {
        let search = self
            .person_search
            .as_deref()
            .map(normalize_name)
            .filter(|term| !term.is_empty());

        let mut matched: Vec<&Occurrence> = occurrences
            .into_iter()
            .filter(|item| {
                self.person_id
                    .as_ref()
                    .map_or(true, |id| &item.person_id == id)
            })
            .filter(|item| {
                self.occurrence_type
                    .as_deref()
                    .map_or(true, |kind| item.occurrence_type == kind)
            })
            .filter(|item| {
                search
                    .as_deref()
                    .map_or(true, |term| normalize_name(&item.person_name).contains(term))
            })
            .filter(|item| self.date.as_deref().map_or(true, |date| item.date == date))
            .collect();

        matched.sort_by(|a, b| compare(self.sort, a, b));
        matched
    }
}

fn compare(mode: SortMode, a: &Occurrence, b: &Occurrence) -> Ordering {
    let by_date = b
        .date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at));
    match mode {
        SortMode::DateDesc => by_date,
        SortMode::DurationDesc => b.duration_minutes.cmp(&a.duration_minutes).then(by_date),
    }
}
