use crate::error::{HeadshotError, Result};
use crate::identity::Identity;
use crate::storage::NamespacedStore;
use crate::usage::{Allowance, UsageRecord};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const AD_KIND: &str = "ads";

/// Stored ad rewards for one window, plus the sessions already paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdRecord {
    #[serde(flatten)]
    window: UsageRecord,
    #[serde(default)]
    completed_sessions: Vec<Uuid>,
}

/// A timed ad view in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdViewSession {
    pub id: Uuid,
    pub identity: Identity,
    pub started_at: DateTime<Utc>,
}

/// Credits earned by watching ads, capped per window.
///
/// Ad rewards use the same windowed record shape as generation usage.
#[derive(Clone)]
pub struct AdRewardLedger {
    store: NamespacedStore,
    min_watch: Duration,
    max_per_window: u32,
    window: Duration,
}

impl AdRewardLedger {
    pub fn new(
        store: NamespacedStore,
        min_watch: Duration,
        max_per_window: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            min_watch,
            max_per_window,
            window,
        }
    }

    pub fn min_watch(&self) -> Duration {
        self.min_watch
    }

    pub fn check_eligibility_at(&self, identity: &Identity, now: DateTime<Utc>) -> Allowance {
        match self.active_record(identity, now) {
            Some(record) if record.window.count >= self.max_per_window => {
                Allowance::denied(record.window.time_until_reset(now, self.window))
            }
            _ => Allowance::granted(),
        }
    }

    pub fn start_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<AdViewSession> {
        let allowance = self.check_eligibility_at(identity, now);
        if !allowance.allowed {
            return Err(HeadshotError::QuotaExceeded {
                retry_after: allowance.retry_after.unwrap_or_else(Duration::zero),
            });
        }

        Ok(AdViewSession {
            id: Uuid::new_v4(),
            identity: identity.clone(),
            started_at: now,
        })
    }

    /// Validates the watch time and counts the reward. Each session pays
    /// out at most once.
    pub fn complete_at(&self, session: &AdViewSession, now: DateTime<Utc>) -> Result<UsageRecord> {
        let watched = now - session.started_at;
        if watched > self.window {
            return Err(HeadshotError::validation(
                "This ad view has expired, start a new one",
            ));
        }
        if watched < self.min_watch {
            let left = (self.min_watch - watched).num_seconds().max(1);
            return Err(HeadshotError::validation(format!(
                "Watch the ad for {left} more second(s) to earn a credit"
            )));
        }

        let allowance = self.check_eligibility_at(&session.identity, now);
        if !allowance.allowed {
            return Err(HeadshotError::QuotaExceeded {
                retry_after: allowance.retry_after.unwrap_or_else(Duration::zero),
            });
        }

        let mut record = self
            .active_record(&session.identity, now)
            .unwrap_or_else(|| AdRecord {
                window: UsageRecord::open(now),
                completed_sessions: Vec::new(),
            });
        if record.completed_sessions.contains(&session.id) {
            return Err(HeadshotError::validation("This ad view was already rewarded"));
        }

        record.window.count += 1;
        record.completed_sessions.push(session.id);
        self.store
            .write(&self.store.key(AD_KIND, &session.identity), &record)?;
        Ok(record.window)
    }

    fn active_record(&self, identity: &Identity, now: DateTime<Utc>) -> Option<AdRecord> {
        self.store
            .read::<AdRecord>(&self.store.key(AD_KIND, identity))
            .filter(|record| !record.window.is_expired(now, self.window))
    }
}
