//! Domain model for people and their occurrences.
//!
//! # Responsibility
//! - Define the records owned by the occurrence store.
//! - Provide field-level validation for user input (duration, date, name).
//!
//! # Invariants
//! - `Person.person_id` is stable once assigned.
//! - Occurrences created through the store have a non-empty name and date
//!   and a positive duration.

pub mod duration;
pub mod occurrence;
pub mod person;
