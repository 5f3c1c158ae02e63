//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations with CSV persistence.
//! - Keep CLI/UI callers decoupled from storage details.

pub mod occurrence_service;
