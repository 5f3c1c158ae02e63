//! Normalized-name to person ID registry.

use crate::identity::normalize::normalize_name;
use crate::model::person::{Person, PersonId};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Owns the `person_id -> Person` and `normalized_name -> person_id` maps.
#[derive(Debug, Clone, Default)]
pub struct PersonRegistry {
    people: BTreeMap<PersonId, Person>,
    by_normalized: HashMap<String, PersonId>,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the person for `name`, creating one when the normalized key is new.
    ///
    /// An existing person takes `name` as its display spelling when it
    /// differs. Returns `None` for names that normalize to empty.
    pub fn resolve(&mut self, name: &str) -> Option<&Person> {
        let display = name.trim();
        let normalized = normalize_name(display);
        if normalized.is_empty() {
            return None;
        }

        let person_id = match self.by_normalized.get(&normalized) {
            Some(existing) => existing.clone(),
            None => {
                let allocated = self.next_person_id();
                debug!(
                    "event=person_allocate module=identity person_id={}",
                    allocated
                );
                allocated
            }
        };

        Some(self.bind(person_id, display, normalized))
    }

    /// ID `name` would resolve to, without registering anything.
    ///
    /// Blank names preview the next free ID.
    pub fn preview_person_id(&self, name: &str) -> PersonId {
        self.id_for_normalized(&normalize_name(name))
            .cloned()
            .unwrap_or_else(|| self.next_person_id())
    }

    /// Next sequential ID: one past the largest numeric suffix in use.
    ///
    /// When that suffix is already `u64::MAX`, the lowest free `P####` is
    /// used instead. The result is never a registered ID.
    pub fn next_person_id(&self) -> PersonId {
        let max = self
            .people
            .keys()
            .filter_map(PersonId::sequence)
            .max()
            .unwrap_or(0);
        match max.checked_add(1) {
            Some(next) => PersonId::from_sequence(next),
            None => self.lowest_free_person_id(),
        }
    }

    fn lowest_free_person_id(&self) -> PersonId {
        // At most `len()` candidates are taken, so this stops within `len() + 1` steps.
        let mut sequence = 1;
        loop {
            let candidate = PersonId::from_sequence(sequence);
            if !self.people.contains_key(&candidate) {
                return candidate;
            }
            sequence += 1;
        }
    }

    pub fn id_for_normalized(&self, normalized: &str) -> Option<&PersonId> {
        self.by_normalized.get(normalized)
    }

    /// Looks a person up by any spelling of their name.
    pub fn find_by_name(&self, name: &str) -> Option<&Person> {
        self.id_for_normalized(&normalize_name(name))
            .and_then(|id| self.people.get(id))
    }

    pub fn get(&self, person_id: &PersonId) -> Option<&Person> {
        self.people.get(person_id)
    }

    /// People ordered by ID.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Registers `person_id` for `normalized` and refreshes the display name.
    ///
    /// Callers guarantee `person_id` is not bound to another normalized name.
    pub(crate) fn bind(&mut self, person_id: PersonId, name: &str, normalized: String) -> &Person {
        self.by_normalized
            .insert(normalized.clone(), person_id.clone());
        let person = self
            .people
            .entry(person_id.clone())
            .or_insert_with(|| Person {
                person_id,
                name: name.to_string(),
                normalized_name: normalized.clone(),
            });
        if person.name != name {
            person.name = name.to_string();
        }
        person.normalized_name = normalized;
        person
    }
}

#[cfg(test)]
mod tests {
    use super::PersonRegistry;
    use crate::model::person::PersonId;

    #[test]
    fn equal_normalized_names_share_one_id() {
        let mut registry = PersonRegistry::new();
        let first = registry.resolve("José da Silva").unwrap().person_id.clone();
        let second = registry.resolve("  JOSE  DA SILVA").unwrap().clone();

        assert_eq!(first, PersonId::new("P0001"));
        assert_eq!(second.person_id, first);
        assert_eq!(second.name, "JOSE  DA SILVA");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repeated_identical_calls_are_idempotent() {
        let mut registry = PersonRegistry::new();
        let a = registry.resolve("Ana").unwrap().clone();
        let b = registry.resolve("Ana").unwrap().clone();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn allocates_past_the_largest_suffix() {
        let mut registry = PersonRegistry::new();
        registry.bind(PersonId::new("P0041"), "Bia", "bia".to_string());
        registry.bind(PersonId::new("legacy-7"), "Caio", "caio".to_string());

        assert_eq!(registry.next_person_id(), PersonId::new("P0042"));
        let created = registry.resolve("Duda").unwrap();
        assert_eq!(created.person_id, PersonId::new("P0042"));
    }

    #[test]
    fn allocation_never_reuses_a_taken_id_at_the_u32_boundary() {
        let mut registry = PersonRegistry::new();
        registry.bind(PersonId::new("P4294967295"), "Ana", "ana".to_string());

        let bruno = registry.resolve("Bruno").unwrap().person_id.clone();

        assert_eq!(bruno, PersonId::new("P4294967296"));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(&PersonId::new("P4294967295")).unwrap().name,
            "Ana"
        );
    }

    #[test]
    fn exhausted_sequence_falls_back_to_lowest_free_id() {
        let mut registry = PersonRegistry::new();
        registry.bind(PersonId::new(format!("P{}", u64::MAX)), "Ana", "ana".to_string());
        registry.bind(PersonId::new("P0001"), "Bia", "bia".to_string());

        let caio = registry.resolve("Caio").unwrap().person_id.clone();

        assert_eq!(caio, PersonId::new("P0002"));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.find_by_name("ana").unwrap().name, "Ana");
    }

    #[test]
    fn blank_names_are_never_registered() {
        let mut registry = PersonRegistry::new();
        assert!(registry.resolve("   ").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn preview_does_not_mutate() {
        let mut registry = PersonRegistry::new();
        registry.resolve("Ana").unwrap();

        assert_eq!(registry.preview_person_id("ANA"), PersonId::new("P0001"));
        assert_eq!(registry.preview_person_id("Bruno"), PersonId::new("P0002"));
        assert_eq!(registry.preview_person_id(""), PersonId::new("P0002"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.find_by_name("ána").map(|p| p.person_id.as_str()),
            Some("P0001")
        );
    }
}
