//! In-memory CSV storage for embedders and tests.

use super::{CsvStorage, StorageError, StorageResult};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared in-memory document; clones see the same text.
#[derive(Debug, Clone, Default)]
pub struct MemoryCsvStorage {
    text: Rc<RefCell<Option<String>>>,
    writes_denied: Rc<Cell<bool>>,
}

impl MemoryCsvStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.text.borrow_mut() = Some(text.into());
        storage
    }

    /// Makes every following write fail with `StorageError::Unavailable`.
    pub fn deny_writes(&self, denied: bool) {
        self.writes_denied.set(denied);
    }

    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }
}

impl CsvStorage for MemoryCsvStorage {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn read_text(&self) -> StorageResult<Option<String>> {
        Ok(self.text())
    }

    fn write_text(&self, text: &str) -> StorageResult<()> {
        if self.writes_denied.get() {
            return Err(StorageError::Unavailable("write permission denied".to_string()));
        }
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}
