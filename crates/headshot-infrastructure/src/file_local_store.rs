//! File-backed `LocalStore`.
//!
//! All keys live in one JSON object on disk. Reads come from an in-memory
//! copy loaded at open; writes go through the atomic file and refresh it.

use crate::storage::{AtomicJsonError, AtomicJsonFile};
use headshot_core::storage::LocalStore;
use headshot_core::{HeadshotError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

type Entries = BTreeMap<String, String>;

pub struct FileLocalStore {
    file: AtomicJsonFile<Entries>,
    cache: Mutex<Entries>,
}

impl FileLocalStore {
    /// Opens the store at `path`. A corrupt file is treated as empty and is
    /// overwritten on the next write.
    pub fn open(path: PathBuf) -> Self {
        let file = AtomicJsonFile::new(path);
        let entries = match file.load() {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    "Local store {} is unreadable, starting empty: {}",
                    file.path().display(),
                    e
                );
                Entries::new()
            }
        };

        Self {
            file,
            cache: Mutex::new(entries),
        }
    }

    fn mutate<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&mut Entries),
    {
        let mut cache = self
            .cache
            .lock()
            .map_err(|e| HeadshotError::internal(format!("Local store lock poisoned: {}", e)))?;

        let snapshot = match self.file.update(Entries::new(), |entries| {
            f(entries);
            entries.clone()
        }) {
            Ok(snapshot) => snapshot,
            Err(AtomicJsonError::JsonError(e)) => {
                // Corrupt on disk: the in-memory copy becomes the new truth.
                tracing::warn!("Replacing corrupt local store: {}", e);
                let mut entries = cache.clone();
                f(&mut entries);
                self.file.save(&entries)?;
                entries
            }
            Err(e) => return Err(e.into()),
        };

        *cache = snapshot;
        Ok(())
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let cache = self
            .cache
            .lock()
            .map_err(|e| HeadshotError::internal(format!("Local store lock poisoned: {}", e)))?;
        Ok(cache.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.clone());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headshot_core::Identity;
    use headshot_core::storage::NamespacedStore;
    use headshot_core::usage::UsageTracker;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local_store.json");

        let store = FileLocalStore::open(path.clone());
        store.set("a", "1".into()).unwrap();
        store.set("b", "2".into()).unwrap();
        store.remove("a").unwrap();

        let reopened = FileLocalStore::open(path);
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_corrupt_file_starts_empty_and_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local_store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileLocalStore::open(path.clone());
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v".into()).unwrap();
        let reopened = FileLocalStore::open(path);
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_usage_persists_across_processes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local_store.json");
        let identity = Identity::Anonymous;

        let tracker = |path: PathBuf| {
            let store = NamespacedStore::new(Arc::new(FileLocalStore::open(path)), "headshot");
            UsageTracker::new(store, 3, chrono::Duration::hours(24))
        };

        let first = tracker(path.clone());
        first.consume(&identity).unwrap();
        first.consume(&identity).unwrap();

        let second = tracker(path);
        assert_eq!(second.remaining(&identity), 1);
    }
}
