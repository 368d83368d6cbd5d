//! Configuration service implementation.
//!
//! Loads `AppConfig` from `config.toml`, falling back to defaults when the
//! file is missing, and applies environment overrides on top.

use crate::paths::{HeadshotPaths, ServiceType};
use headshot_core::config::AppConfig;
use headshot_core::{HeadshotError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Overrides `server.port`.
pub const PORT_ENV: &str = "HEADSHOT_PORT";

/// Configuration service that loads and caches `AppConfig`.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let path = HeadshotPaths::new(base_path)
            .get_path(ServiceType::Config)
            .map_err(|e| HeadshotError::config(format!("Failed to get config path: {}", e)))?;
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A malformed file is an error; a missing one yields defaults.
    pub fn get_config(&self) -> Result<AppConfig> {
        if let Ok(read_lock) = self.config.read() {
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = self.load_config()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load_config(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            HeadshotError::config(format!(
                "Invalid config file {}: {}",
                self.path.display(),
                e.message()
            ))
        })?;
        Ok(config)
    }
}

/// Applies environment overrides through `lookup`.
///
/// Unparseable values are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(PORT_ENV) {
        match raw.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!("Ignoring invalid {}={:?}", PORT_ENV, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(Some(temp_dir.path())).unwrap();
        let config = service.load_config().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_loads_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(Some(temp_dir.path())).unwrap();
        std::fs::write(service.path(), "[usage]\ndaily_cap = 7\n").unwrap();

        assert_eq!(service.load_config().unwrap().usage.daily_cap, 7);

        let first = service.get_config().unwrap();
        std::fs::write(service.path(), "[usage]\ndaily_cap = 1\n").unwrap();
        assert_eq!(service.get_config().unwrap().usage, first.usage);

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().usage.daily_cap, 1);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(Some(temp_dir.path())).unwrap();
        std::fs::write(service.path(), "[usage\n").unwrap();

        let err = service.get_config().unwrap_err();
        assert!(matches!(err, HeadshotError::Config(_)));
    }

    #[test]
    fn test_port_override() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| {
            (key == PORT_ENV).then(|| "9090".to_string())
        });
        assert_eq!(config.server.port, 9090);

        apply_env_overrides(&mut config, |_| Some("not-a-port".to_string()));
        assert_eq!(config.server.port, 9090);
    }
}
