//! File-backed CSV storage with atomic replace.

use super::{CsvStorage, StorageError, StorageResult};
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// CSV document stored at a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCsvStorage {
    path: PathBuf,
}

impl FileCsvStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CsvStorage for FileCsvStorage {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_text(&self) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn write_text(&self, text: &str) -> StorageResult<()> {
        // Temp file in the target directory so the final rename stays on one filesystem.
        let mut temp = NamedTempFile::new_in(self.parent_dir()).map_err(|err| self.io_error(err))?;
        temp.write_all(text.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| self.io_error(err))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        debug!(
            "event=csv_write module=storage status=ok bytes={}",
            text.len()
        );
        Ok(())
    }
}
