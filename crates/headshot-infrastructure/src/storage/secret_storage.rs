//! Secret configuration file storage.
//!
//! Read-only access to `secret.json`.

use headshot_core::config::SecretConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SecretStorageError {
    /// Configuration file not found.
    NotFound(PathBuf),
    IoError(std::io::Error),
    ParseError(serde_json::Error),
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::NotFound(path) => {
                write!(f, "Secret file not found at: {}", path.display())
            }
            SecretStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SecretStorageError::ParseError(e) => write!(f, "JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<std::io::Error> for SecretStorageError {
    fn from(e: std::io::Error) -> Self {
        SecretStorageError::IoError(e)
    }
}

impl From<serde_json::Error> for SecretStorageError {
    fn from(e: serde_json::Error) -> Self {
        SecretStorageError::ParseError(e)
    }
}

/// Storage for `secret.json`.
///
/// # Security Note
///
/// The file is plaintext JSON and should be mode 600. Parse errors never
/// echo file content.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the secret configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(SecretConfig)`: Successfully loaded and parsed
    /// - `Err(SecretStorageError::NotFound)`: File doesn't exist
    /// - `Err(SecretStorageError::IoError)`: Failed to read file
    /// - `Err(SecretStorageError::ParseError)`: Invalid JSON format
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        let storage = SecretStorage::with_path(file_path.clone());

        match storage.load() {
            Err(SecretStorageError::NotFound(path)) => assert_eq!(path, file_path),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_valid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(
            &file_path,
            r#"{
                "gemini": { "api_key": "test-key-123" },
                "firebase": { "api_key": "fb-key", "project_id": "headshots" }
            }"#,
        )
        .unwrap();

        let config = SecretStorage::with_path(file_path).load().unwrap();

        assert_eq!(config.gemini.unwrap().api_key, "test-key-123");
        let firebase = config.firebase.unwrap();
        assert_eq!(firebase.project_id.as_deref(), Some("headshots"));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("secret.json");
        fs::write(&file_path, r#"{ invalid json"#).unwrap();

        let result = SecretStorage::with_path(file_path).load();
        assert!(matches!(result, Err(SecretStorageError::ParseError(_))));
    }
}
