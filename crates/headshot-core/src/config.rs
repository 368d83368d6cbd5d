//! Application configuration models.
//!
//! `AppConfig` mirrors `config.toml`; every section falls back to defaults so a
//! missing or partial file is valid. `SecretConfig` mirrors `secret.json`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::generation::RetryPolicy;

pub const DEFAULT_DAILY_CAP: u32 = 3;
pub const DEFAULT_STORAGE_PREFIX: &str = "headshot";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub usage: UsageSettings,
    #[serde(default)]
    pub credits: CreditSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub document_store: DocumentStoreSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Daily generation quota.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct UsageSettings {
    #[serde(default = "default_daily_cap")]
    pub daily_cap: u32,
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Namespace for every key written to the local store.
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
}

impl UsageSettings {
    pub fn window(&self) -> Duration {
        Duration::hours(self.window_hours)
    }
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            daily_cap: default_daily_cap(),
            window_hours: default_window_hours(),
            storage_prefix: default_storage_prefix(),
        }
    }
}

/// Bonus-credit side channels (social share, timed ad).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CreditSettings {
    #[serde(default = "default_window_hours")]
    pub share_cooldown_hours: i64,
    #[serde(default = "default_ad_min_watch_secs")]
    pub ad_min_watch_secs: i64,
    #[serde(default = "default_ads_per_day")]
    pub ads_per_day: u32,
    /// Link included in share posts.
    #[serde(default = "default_share_url")]
    pub share_url: String,
}

impl CreditSettings {
    pub fn share_cooldown(&self) -> Duration {
        Duration::hours(self.share_cooldown_hours)
    }

    pub fn ad_min_watch(&self) -> Duration {
        Duration::seconds(self.ad_min_watch_secs)
    }
}

impl Default for CreditSettings {
    fn default() -> Self {
        Self {
            share_cooldown_hours: default_window_hours(),
            ad_min_watch_secs: default_ad_min_watch_secs(),
            ads_per_day: default_ads_per_day(),
            share_url: default_share_url(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: std::time::Duration::from_millis(self.base_delay_ms),
            max_jitter: std::time::Duration::from_millis(self.max_jitter_ms),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

/// Image model selection. An unset `model` defers to the key's own
/// `model_name` in secret.json, then to [`DEFAULT_IMAGE_MODEL`].
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct GenerationSettings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Remote document store. Without a project id the blog runs on mock data.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct DocumentStoreSettings {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_json: false,
        }
    }
}

/// API keys loaded from `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FirebaseConfig {
    pub api_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_daily_cap() -> u32 {
    DEFAULT_DAILY_CAP
}

fn default_window_hours() -> i64 {
    24
}

fn default_storage_prefix() -> String {
    DEFAULT_STORAGE_PREFIX.to_string()
}

fn default_ad_min_watch_secs() -> i64 {
    15
}

fn default_ads_per_day() -> u32 {
    3
}

fn default_share_url() -> String {
    "https://headshot.studio".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_max_jitter_ms() -> u64 {
    1000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.usage.daily_cap, 3);
        assert_eq!(config.usage.window(), Duration::hours(24));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [usage]
            daily_cap = 5

            [retry]
            base_delay_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.usage.daily_cap, 5);
        assert_eq!(config.usage.storage_prefix, "headshot");
        let policy = config.retry.policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, std::time::Duration::from_millis(10));
    }

    #[test]
    fn test_secret_config_from_json() {
        let secrets: SecretConfig = serde_json::from_str(
            r#"{ "gemini": { "api_key": "k-123" } }"#,
        )
        .unwrap();
        let gemini = secrets.gemini.unwrap();
        assert_eq!(gemini.api_key, "k-123");
        assert!(gemini.model_name.is_none());
        assert!(secrets.firebase.is_none());
    }
}
