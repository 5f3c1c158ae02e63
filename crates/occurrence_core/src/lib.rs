//! Core domain logic for the occurrence log.
//! This crate is the single source of truth for identity and CSV invariants.

pub mod csv;
pub mod identity;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use csv::codec::{decode, encode, CsvFormatError, DecodedCsv};
pub use csv::schema::{DecodedRow, HeaderSchema};
pub use identity::import::{ImportConflict, ImportReport};
pub use identity::normalize::normalize_name;
pub use identity::registry::PersonRegistry;
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::duration::{
    format_duration_input, format_duration_label, parse_duration, DurationError, DurationFormat,
};
pub use model::occurrence::{
    FieldError, InputField, InputValidationError, Occurrence, OccurrenceId, OccurrenceInput,
    DEFAULT_OCCURRENCE_TYPE,
};
pub use model::person::{Person, PersonId};
pub use service::occurrence_service::{OccurrenceService, ReconnectOutcome, ServiceError};
pub use storage::{CsvStorage, FileCsvStorage, MemoryCsvStorage, StorageError, StorageResult};
pub use store::aggregate::{
    aggregate_by_person, daily_summary, AggregateMetric, AggregateScope, DailySummary, PersonTotal,
};
pub use store::occurrence_store::{OccurrenceStore, StoreError, StoreResult};
pub use store::query::{OccurrenceQuery, SortMode};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
