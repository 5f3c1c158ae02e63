//! CSV codec for occurrence files.
//!
//! # Responsibility
//! - Tokenize RFC-4180-style CSV text (quoted fields, embedded newlines).
//! - Detect the header schema version and map rows to fixed layouts.
//! - Serialize occurrences with the current header in canonical order.
//!
//! # Invariants
//! - Encoding always writes the current schema.
//! - The codec validates only the header; field rules belong to the store.

pub mod codec;
pub mod schema;
pub mod tokenizer;
