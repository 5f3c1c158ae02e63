//! Per-person totals and daily dashboard figures.

use crate::model::occurrence::Occurrence;
use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Which total ranks the per-person output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMetric {
    #[default]
    Minutes,
    Count,
}

/// Aggregation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateScope {
    /// Only count occurrences on this date.
    pub date: Option<String>,
    pub metric: AggregateMetric,
    /// Keep only the top `limit` entries.
    pub limit: Option<usize>,
}

/// Totals for one `(person_id, person_name)` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonTotal {
    pub person_id: PersonId,
    pub person_name: String,
    pub total_minutes: u64,
    pub occurrence_count: usize,
}

impl PersonTotal {
    fn ranked_value(&self, metric: AggregateMetric) -> u64 {
        match metric {
            AggregateMetric::Minutes => self.total_minutes,
            AggregateMetric::Count => self.occurrence_count as u64,
        }
    }
}

/// Groups occurrences by person and ranks them.
///
/// Order: selected total desc, then `person_name` asc (byte order).
pub fn aggregate_by_person<'a, I>(occurrences: I, scope: &AggregateScope) -> Vec<PersonTotal>
where
    I: IntoIterator<Item = &'a Occurrence>,
{
    let mut groups: BTreeMap<(&PersonId, &str), PersonTotal> = BTreeMap::new();
    for item in occurrences {
        if scope.date.as_deref().is_some_and(|date| item.date != date) {
            continue;
        }
        let entry = groups
            .entry((&item.person_id, item.person_name.as_str()))
            .or_insert_with(|| PersonTotal {
                person_id: item.person_id.clone(),
                person_name: item.person_name.clone(),
                total_minutes: 0,
                occurrence_count: 0,
            });
        entry.total_minutes += u64::from(item.duration_minutes);
        entry.occurrence_count += 1;
    }

    let mut totals: Vec<PersonTotal> = groups.into_values().collect();
    totals.sort_by(|a, b| {
        b.ranked_value(scope.metric)
            .cmp(&a.ranked_value(scope.metric))
            .then_with(|| a.person_name.cmp(&b.person_name))
    });
    if let Some(limit) = scope.limit {
        totals.truncate(limit);
    }
    totals
}

/// Dashboard figures for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub occurrence_count: usize,
    pub unique_people: usize,
    /// Rounded mean duration; `None` when the day has no occurrences.
    pub average_minutes: Option<u64>,
    /// Most frequent type; ties go to the lexically smallest label.
    pub top_type: Option<String>,
}

pub fn daily_summary<'a, I>(occurrences: I, date: &str) -> DailySummary
where
    I: IntoIterator<Item = &'a Occurrence>,
{
    let day: Vec<&Occurrence> = occurrences
        .into_iter()
        .filter(|item| item.date == date)
        .collect();

    let unique_people = day
        .iter()
        .map(|item| &item.person_id)
        .collect::<HashSet<_>>()
        .len();

    let total: u64 = day.iter().map(|item| u64::from(item.duration_minutes)).sum();
    let count = day.len() as u64;
    let average_minutes = (count > 0).then(|| (total + count / 2) / count);

    let mut type_counts: HashMap<&str, usize> = HashMap::new();
    for item in &day {
        *type_counts.entry(item.occurrence_type.as_str()).or_default() += 1;
    }
    let top_type = type_counts
        .into_iter()
        .max_by(|(a_kind, a_count), (b_kind, b_count)| {
            a_count.cmp(b_count).then_with(|| b_kind.cmp(a_kind))
        })
        .map(|(kind, _)| kind.to_string());

    DailySummary {
        date: date.to_string(),
        occurrence_count: day.len(),
        unique_people,
        average_minutes,
        top_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(person: &str, name: &str, kind: &str, date: &str, minutes: u32) -> Occurrence {
        Occurrence {
            occurrence_id: format!("{person}-{date}-{minutes}"),
            person_id: PersonId::new(person),
            person_name: name.to_string(),
            occurrence_type: kind.to_string(),
            date: date.to_string(),
            duration_minutes: minutes,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn sums_per_person_and_orders_by_total() {
        let data = vec![
            item("P1", "Ana", "Visita", "2024-01-01", 30),
            item("P2", "Bia", "Visita", "2024-01-01", 90),
            item("P1", "Ana", "Visita", "2024-01-02", 20),
        ];
        let totals = aggregate_by_person(&data, &AggregateScope::default());

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].person_id.as_str(), "P2");
        assert_eq!(totals[0].total_minutes, 90);
        assert_eq!(totals[1].person_id.as_str(), "P1");
        assert_eq!(totals[1].total_minutes, 50);
        assert_eq!(totals[1].occurrence_count, 2);
    }

    #[test]
    fn ties_break_on_name_and_scope_limits_rows() {
        let data = vec![
            item("P3", "Caio", "Visita", "2024-01-01", 10),
            item("P1", "Ana", "Visita", "2024-01-01", 10),
            item("P2", "Bia", "Visita", "2024-01-02", 99),
        ];
        let scope = AggregateScope {
            date: Some("2024-01-01".to_string()),
            metric: AggregateMetric::Minutes,
            limit: Some(1),
        };
        let totals = aggregate_by_person(&data, &scope);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].person_name, "Ana");
    }

    #[test]
    fn count_metric_ranks_by_records() {
        let data = vec![
            item("P1", "Ana", "Visita", "2024-01-01", 5),
            item("P1", "Ana", "Visita", "2024-01-02", 5),
            item("P2", "Bia", "Visita", "2024-01-01", 500),
        ];
        let scope = AggregateScope {
            metric: AggregateMetric::Count,
            ..AggregateScope::default()
        };
        let totals = aggregate_by_person(&data, &scope);
        assert_eq!(totals[0].person_name, "Ana");
    }

    #[test]
    fn spelling_variants_form_separate_groups() {
        let data = vec![
            item("P1", "José", "Visita", "2024-01-01", 5),
            item("P1", "jose", "Visita", "2024-01-01", 5),
        ];
        assert_eq!(aggregate_by_person(&data, &AggregateScope::default()).len(), 2);
    }

    #[test]
    fn daily_summary_counts_people_average_and_top_type() {
        let data = vec![
            item("P1", "Ana", "Visita", "2024-01-01", 30),
            item("P1", "Ana", "Ligação", "2024-01-01", 45),
            item("P2", "Bia", "Ligação", "2024-01-01", 20),
            item("P2", "Bia", "Visita", "2024-01-02", 600),
        ];
        let summary = daily_summary(&data, "2024-01-01");
        assert_eq!(summary.occurrence_count, 3);
        assert_eq!(summary.unique_people, 2);
        assert_eq!(summary.average_minutes, Some(32));
        assert_eq!(summary.top_type.as_deref(), Some("Ligação"));

        let empty = daily_summary(&data, "2030-01-01");
        assert_eq!(empty.occurrence_count, 0);
        assert_eq!(empty.average_minutes, None);
        assert_eq!(empty.top_type, None);
    }
}
