//! Occurrence store, query and aggregation.
//!
//! # Responsibility
//! - Own the in-memory people and occurrence collections.
//! - Provide filter/sort listing and per-person totals for renderers.
//!
//! # Invariants
//! - Renderers read from the store; they never mutate it directly.

pub mod aggregate;
pub mod occurrence_store;
pub mod query;
