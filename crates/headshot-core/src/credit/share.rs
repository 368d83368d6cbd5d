use crate::error::{HeadshotError, Result};
use crate::identity::Identity;
use crate::storage::NamespacedStore;
use crate::usage::Allowance;
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Social networks a share credit can be earned on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SharePlatform {
    #[strum(to_string = "twitter", serialize = "x")]
    Twitter,
    Linkedin,
    Facebook,
}

impl SharePlatform {
    /// Web intent that opens the platform's share dialog.
    pub fn share_url(&self, link: &str, text: &str) -> Result<String> {
        let (base, params): (&str, Vec<(&str, &str)>) = match self {
            Self::Twitter => (
                "https://twitter.com/intent/tweet",
                vec![("text", text), ("url", link)],
            ),
            Self::Linkedin => (
                "https://www.linkedin.com/sharing/share-offsite/",
                vec![("url", link)],
            ),
            Self::Facebook => (
                "https://www.facebook.com/sharer/sharer.php",
                vec![("u", link)],
            ),
        };

        Url::parse_with_params(base, &params)
            .map(|url| url.to_string())
            .map_err(|e| HeadshotError::validation(format!("Invalid share link: {e}")))
    }
}

/// Last time an identity claimed a share credit on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialShareRecord {
    pub last_shared_at: DateTime<Utc>,
}

/// Per-platform share cooldowns.
#[derive(Clone)]
pub struct ShareLedger {
    store: NamespacedStore,
    cooldown: Duration,
}

impl ShareLedger {
    pub fn new(store: NamespacedStore, cooldown: Duration) -> Self {
        Self { store, cooldown }
    }

    pub fn check_eligibility_at(
        &self,
        identity: &Identity,
        platform: SharePlatform,
        now: DateTime<Utc>,
    ) -> Allowance {
        match self.store.read::<SocialShareRecord>(&self.key(identity, platform)) {
            Some(record) if now - record.last_shared_at < self.cooldown => {
                Allowance::denied(record.last_shared_at + self.cooldown - now)
            }
            _ => Allowance::granted(),
        }
    }

    pub fn check_eligibility(&self, identity: &Identity, platform: SharePlatform) -> Allowance {
        self.check_eligibility_at(identity, platform, Utc::now())
    }

    pub fn record_share(
        &self,
        identity: &Identity,
        platform: SharePlatform,
    ) -> Result<SocialShareRecord> {
        self.record_share_at(identity, platform, Utc::now())
    }

    pub fn record_share_at(
        &self,
        identity: &Identity,
        platform: SharePlatform,
        now: DateTime<Utc>,
    ) -> Result<SocialShareRecord> {
        let record = SocialShareRecord {
            last_shared_at: now,
        };
        self.store.write(&self.key(identity, platform), &record)?;
        Ok(record)
    }

    fn key(&self, identity: &Identity, platform: SharePlatform) -> String {
        self.store.key(&format!("share_{platform}"), identity)
    }
}
