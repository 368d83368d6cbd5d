//! Unified path management for headshot configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/headshot/          # Config directory
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//!
//! ~/.local/share/headshot/     # Data directory
//! ├── local_store.json         # Usage, share and ad records
//! └── logs/                    # Application logs
//!     └── headshot.log.YYYY-MM-DD
//! ```
//!
//! Every path can be rooted under an explicit base directory instead, which
//! is how tests keep their files inside a temp dir.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "headshot";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Files managed by the infrastructure layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    Config,
    Secret,
    LocalStore,
    Logs,
}

#[derive(Debug, Clone, Default)]
pub struct HeadshotPaths {
    base: Option<PathBuf>,
}

impl HeadshotPaths {
    /// `base` overrides both the config and the data root.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn get_path(&self, service: ServiceType) -> Result<PathBuf, PathError> {
        Ok(match service {
            ServiceType::Config => self.config_dir()?.join("config.toml"),
            ServiceType::Secret => self.config_dir()?.join("secret.json"),
            ServiceType::LocalStore => self.data_dir()?.join("local_store.json"),
            ServiceType::Logs => self.data_dir()?.join("logs"),
        })
    }

    /// Ensures the secret file exists, creating an empty template if it doesn't.
    ///
    /// The file is created with mode 600 on Unix.
    pub fn ensure_secret_file(&self) -> Result<PathBuf, std::io::Error> {
        let secret_path = self
            .get_path(ServiceType::Secret)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        if secret_path.exists() {
            return Ok(secret_path);
        }

        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        use headshot_core::config::{FirebaseConfig, GeminiConfig, SecretConfig};

        let template_config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: Some(headshot_core::config::DEFAULT_IMAGE_MODEL.to_string()),
            }),
            firebase: Some(FirebaseConfig {
                api_key: String::new(),
                project_id: None,
            }),
        };

        let template_json = serde_json::to_string_pretty(&template_config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&secret_path, template_json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        Ok(secret_path)
    }
}
