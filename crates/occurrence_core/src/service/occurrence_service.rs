//! Occurrence use-case service.
//!
//! # Responsibility
//! - Connect the store to a CSV storage collaborator.
//! - Persist every mutation, committing in memory only after a successful write.
//! - Keep the conflict list of the last import for display.
//!
//! # Invariants
//! - A failed write or a rejected CSV leaves in-memory state unchanged.
//! - Without a connected storage, mutations stay in memory only.

use crate::csv::codec::{decode, CsvFormatError};
use crate::identity::import::{ImportConflict, ImportReport};
use crate::model::occurrence::{Occurrence, OccurrenceInput};
use crate::storage::{CsvStorage, StorageError};
use crate::store::occurrence_store::{OccurrenceStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for occurrence use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// CSV text has an unknown header.
    Format(CsvFormatError),
    /// Input validation or missing occurrence.
    Store(StoreError),
    /// Storage collaborator failure, passed through as reported.
    Storage(StorageError),
    /// Import was asked to load blank text.
    EmptyImport,
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "failed to save CSV: {err}"),
            Self::EmptyImport => write!(f, "no CSV content to import"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::EmptyImport => None,
        }
    }
}

impl From<CsvFormatError> for ServiceError {
    fn from(value: CsvFormatError) -> Self {
        Self::Format(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// What a best-effort reconnect found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectOutcome {
    /// Storage held a document; it was imported.
    Loaded(ImportReport),
    /// Storage is reachable but holds no text yet.
    Empty,
}

/// Service facade over the store and an optional connected storage.
pub struct OccurrenceService<S: CsvStorage> {
    store: OccurrenceStore,
    storage: Option<S>,
    conflicts: Vec<ImportConflict>,
}

impl<S: CsvStorage> Default for OccurrenceService<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CsvStorage> OccurrenceService<S> {
    /// Creates a disconnected service with an empty store.
    pub fn new() -> Self {
        Self {
            store: OccurrenceStore::new(),
            storage: None,
            conflicts: Vec::new(),
        }
    }

    /// Connects `storage` and loads its contents when non-blank.
    ///
    /// On failure the previous connection and contents stay in place.
    pub fn connect(&mut self, storage: S) -> Result<Option<ImportReport>, ServiceError> {
        let text = storage.read_text()?;
        let report = match text.as_deref() {
            Some(text) if !text.trim().is_empty() => Some(self.load(text)?),
            _ => None,
        };
        info!(
            "event=csv_connect module=service status=ok location={} loaded={}",
            storage.describe(),
            report.is_some()
        );
        self.storage = Some(storage);
        Ok(report)
    }

    /// Best-effort reconnect to a previously used storage.
    ///
    /// Callers may ignore the error; the service then simply stays as it was.
    pub fn reconnect(&mut self, storage: S) -> Result<ReconnectOutcome, ServiceError> {
        match self.connect(storage) {
            Ok(Some(report)) => Ok(ReconnectOutcome::Loaded(report)),
            Ok(None) => Ok(ReconnectOutcome::Empty),
            Err(err) => {
                warn!(
                    "event=csv_reconnect module=service status=error error={}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Drops the connected storage; in-memory contents are kept.
    pub fn disconnect(&mut self) -> Option<S> {
        self.storage.take()
    }

    pub fn is_connected(&self) -> bool {
        self.storage.is_some()
    }

    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }

    /// Replaces the store with `text` without writing to storage.
    pub fn import_text(&mut self, text: &str) -> Result<ImportReport, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyImport);
        }
        self.load(text)
    }

    /// Current contents as CSV text.
    pub fn export_text(&self) -> String {
        self.store.to_csv()
    }

    /// Writes current contents to the connected storage; no-op when disconnected.
    pub fn save(&self) -> Result<(), ServiceError> {
        self.persist(&self.store)
    }

    pub fn record(&mut self, input: &OccurrenceInput) -> Result<Occurrence, ServiceError> {
        self.commit(|store| store.create_occurrence(input))
    }

    pub fn edit(
        &mut self,
        occurrence_id: &str,
        input: &OccurrenceInput,
    ) -> Result<Occurrence, ServiceError> {
        self.commit(|store| store.update_occurrence(occurrence_id, input))
    }

    pub fn remove(&mut self, occurrence_id: &str) -> Result<Occurrence, ServiceError> {
        self.commit(|store| store.delete_occurrence(occurrence_id))
    }

    pub fn store(&self) -> &OccurrenceStore {
        &self.store
    }

    /// Conflicts reported by the most recent import.
    pub fn conflicts(&self) -> &[ImportConflict] {
        &self.conflicts
    }

    fn load(&mut self, text: &str) -> Result<ImportReport, ServiceError> {
        let decoded = decode(text)?;
        let report = self.store.import_rows(&decoded);
        self.conflicts = report.conflicts.clone();
        Ok(report)
    }

    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut OccurrenceStore) -> Result<T, StoreError>,
    ) -> Result<T, ServiceError> {
        let mut draft = self.store.clone();
        let value = mutate(&mut draft)?;
        self.persist(&draft)?;
        self.store = draft;
        Ok(value)
    }

    fn persist(&self, store: &OccurrenceStore) -> Result<(), ServiceError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        storage.write_text(&store.to_csv()).map_err(|err| {
            warn!(
                "event=csv_write module=service status=error location={} error={}",
                storage.describe(),
                err
            );
            ServiceError::Storage(err)
        })
    }
}
