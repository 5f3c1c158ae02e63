//! Person identity resolution.
//!
//! # Responsibility
//! - Derive the dedup key for free-text person names.
//! - Map normalized names to stable `P####` IDs.
//! - Reconcile stated IDs against names when importing foreign CSV data.
//!
//! # Invariants
//! - One normalized name maps to at most one person ID.
//! - Import conflicts are reported as data; import never aborts on them.

pub mod import;
pub mod normalize;
pub mod registry;
