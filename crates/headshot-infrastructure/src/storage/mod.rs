//! Storage layer for atomic file operations.

mod atomic_json;
mod secret_storage;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use secret_storage::{SecretStorage, SecretStorageError};
