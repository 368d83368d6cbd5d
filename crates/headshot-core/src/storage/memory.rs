use super::LocalStore;
use crate::error::{HeadshotError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory [`LocalStore`], used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops everything, like a user clearing site data.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| HeadshotError::internal(format!("Local store lock poisoned: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| HeadshotError::internal(format!("Local store lock poisoned: {e}")))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| HeadshotError::internal(format!("Local store lock poisoned: {e}")))?;
        entries.remove(key);
        Ok(())
    }
}
