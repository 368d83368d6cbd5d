//! Client-local key/value storage.
//!
//! Usage, share and ad records live in a small string-keyed store, the same
//! shape a browser's local storage offers. Access is synchronous; nothing
//! protects two processes writing the same store.

mod memory;

pub use memory::MemoryLocalStore;

use crate::error::Result;
use crate::identity::Identity;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// A synchronous string key/value store.
pub trait LocalStore: Send + Sync {
    /// Returns the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed JSON records under a fixed key prefix.
///
/// Keys look like `{prefix}_{kind}_{identity}`. Unreadable or corrupt values
/// are reported as absent, which resets the affected record.
#[derive(Clone)]
pub struct NamespacedStore {
    store: Arc<dyn LocalStore>,
    prefix: String,
}

impl NamespacedStore {
    pub fn new(store: Arc<dyn LocalStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, kind: &str, identity: &Identity) -> String {
        format!("{}_{}_{}", self.prefix, kind, identity.key_fragment())
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read local record {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring corrupt local record {}: {}", key, e);
                None
            }
        }
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key)
    }
}
