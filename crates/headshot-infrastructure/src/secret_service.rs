//! Secret service implementation.
//!
//! Reads `secret.json` once, overlays `GEMINI_API_KEY` / `FIREBASE_API_KEY`
//! from the environment and caches the result.

use crate::paths::{HeadshotPaths, ServiceType};
use crate::storage::{SecretStorage, SecretStorageError};
use headshot_core::config::{FirebaseConfig, GeminiConfig, SecretConfig};
use headshot_core::secret::SecretService;
use headshot_core::{HeadshotError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const FIREBASE_API_KEY_ENV: &str = "FIREBASE_API_KEY";

/// Service for loading secret configuration.
#[derive(Clone)]
pub struct SecretServiceImpl {
    storage: Arc<SecretStorage>,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
    read_env: bool,
}

impl SecretServiceImpl {
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let path = HeadshotPaths::new(base_path)
            .get_path(ServiceType::Secret)
            .map_err(|e| HeadshotError::config(format!("Failed to get secret path: {}", e)))?;
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            storage: Arc::new(SecretStorage::with_path(path)),
            secrets: Arc::new(RwLock::new(None)),
            read_env: true,
        }
    }

    /// Disables the environment overlay.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    fn load_secrets_internal(&self) -> std::result::Result<SecretConfig, String> {
        if let Ok(read_lock) = self.secrets.read() {
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = match self.storage.load() {
            Ok(config) => config,
            Err(SecretStorageError::NotFound(path)) => {
                tracing::debug!("No secret file at {}", path.display());
                SecretConfig::default()
            }
            Err(e) => return Err(format!("Failed to load secrets: {}", e)),
        };

        if self.read_env {
            overlay_env(&mut loaded, |key| std::env::var(key).ok());
        }

        if let Ok(mut write_lock) = self.secrets.write() {
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }
}

/// Environment keys win over file keys. Empty values are ignored.
pub fn overlay_env<F>(secrets: &mut SecretConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(api_key) = non_empty(GEMINI_API_KEY_ENV) {
        match secrets.gemini.as_mut() {
            Some(gemini) => gemini.api_key = api_key,
            None => {
                secrets.gemini = Some(GeminiConfig {
                    api_key,
                    model_name: None,
                })
            }
        }
    }

    if let Some(api_key) = non_empty(FIREBASE_API_KEY_ENV) {
        match secrets.firebase.as_mut() {
            Some(firebase) => firebase.api_key = api_key,
            None => {
                secrets.firebase = Some(FirebaseConfig {
                    api_key,
                    project_id: None,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> std::result::Result<SecretConfig, String> {
        self.load_secrets_internal()
    }

    async fn secret_file_exists(&self) -> bool {
        self.storage.path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_empty_config() {
        let temp_dir = TempDir::new().unwrap();
        let service = SecretServiceImpl::new(Some(temp_dir.path()))
            .unwrap()
            .without_env();

        assert!(!service.secret_file_exists().await);
        let secrets = service.load_secrets().await.unwrap();
        assert!(secrets.gemini.is_none());
    }

    #[tokio::test]
    async fn test_secrets_are_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(&path, r#"{ "gemini": { "api_key": "first" } }"#).unwrap();

        let service = SecretServiceImpl::with_path(path.clone()).without_env();
        assert_eq!(
            service.load_secrets().await.unwrap().gemini.unwrap().api_key,
            "first"
        );

        std::fs::write(&path, r#"{ "gemini": { "api_key": "second" } }"#).unwrap();
        assert_eq!(
            service.load_secrets().await.unwrap().gemini.unwrap().api_key,
            "first"
        );
    }

    #[tokio::test]
    async fn test_parse_error_does_not_leak_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(&path, "sk-live-abcdef {").unwrap();

        let service = SecretServiceImpl::with_path(path).without_env();
        let err = service.load_secrets().await.unwrap_err();
        assert!(!err.contains("sk-live-abcdef"));
    }

    #[test]
    fn test_env_overlay() {
        let mut secrets = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "file-key".into(),
                model_name: Some("custom-model".into()),
            }),
            firebase: None,
        };

        overlay_env(&mut secrets, |key| match key {
            GEMINI_API_KEY_ENV => Some("env-key".into()),
            FIREBASE_API_KEY_ENV => Some("  ".into()),
            _ => None,
        });

        let gemini = secrets.gemini.unwrap();
        assert_eq!(gemini.api_key, "env-key");
        assert_eq!(gemini.model_name.as_deref(), Some("custom-model"));
        assert!(secrets.firebase.is_none());
    }
}
