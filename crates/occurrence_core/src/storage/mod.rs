//! Storage collaborators that hold CSV text between sessions.
//!
//! # Responsibility
//! - Read and write whole CSV documents as text.
//! - Report I/O failures verbatim to the caller.
//!
//! # Invariants
//! - A failed write never leaves a partially written document behind.
//! - Storage never mutates store state; the service decides what to commit.

mod file;
mod memory;

pub use file::FileCsvStorage;
pub use memory::MemoryCsvStorage;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StorageResult<T> = Result<T, StorageError>;

/// Boundary I/O failure.
#[derive(Debug)]
pub enum StorageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Storage refused the operation (e.g. write access withdrawn).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Unavailable(_) => None,
        }
    }
}

/// Whole-document CSV persistence.
pub trait CsvStorage {
    /// Human-readable location, e.g. a file path.
    fn describe(&self) -> String;
    /// Stored text, or `None` when nothing has been written yet.
    fn read_text(&self) -> StorageResult<Option<String>>;
    /// Replaces the stored text.
    fn write_text(&self, text: &str) -> StorageResult<()>;
}
