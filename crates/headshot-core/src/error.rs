//! Error types for Headshot Studio.

use crate::generation::GenerationError;
use chrono::Duration;
use thiserror::Error;

/// A shared error type for the whole workspace.
///
/// Every variant maps to one of the user-visible failure classes: retried
/// rate limits, safety rejections, missing configuration, degraded backends
/// and inline validation errors. None of them is fatal to the process.
#[derive(Error, Debug, Clone)]
pub enum HeadshotError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (local store or document store)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local validation error (bad file, malformed email, illegal transition)
    #[error("{0}")]
    Validation(String),

    /// Daily allowance used up
    #[error("Daily limit reached, try again in {}", format_wait(.retry_after))]
    QuotaExceeded { retry_after: Duration },

    /// Another request is already in flight for this session
    #[error("A request is already being processed")]
    Busy,

    /// A response arrived after the session moved on
    #[error("Discarded stale response for request #{token}")]
    StaleResponse { token: u64 },

    /// Sign-up / sign-in failure reported by the auth provider
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Failure talking to the image-generation API
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HeadshotError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Message suitable for showing inline next to the failed action.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation(err) => err.user_message(),
            Self::QuotaExceeded { .. } | Self::Validation(_) | Self::Busy | Self::Auth(_) => {
                self.to_string()
            }
            Self::Config(msg) => format!("Setup required: {msg}"),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Formats a wait time as "Xh Ym" / "Ym" / "Xs".
pub fn format_wait(wait: &Duration) -> String {
    let secs = wait.num_seconds().max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{secs}s")
    }
}

impl From<std::io::Error> for HeadshotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for HeadshotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for HeadshotError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for HeadshotError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at repository seams)
impl From<anyhow::Error> for HeadshotError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, HeadshotError>`.
pub type Result<T> = std::result::Result<T, HeadshotError>;
