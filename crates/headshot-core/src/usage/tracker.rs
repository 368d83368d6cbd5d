use super::model::{Allowance, UsageRecord};
use crate::config::UsageSettings;
use crate::error::Result;
use crate::identity::Identity;
use crate::storage::NamespacedStore;
use chrono::{DateTime, Duration, Utc};

const USAGE_KIND: &str = "usage";

/// Daily generation quota kept in the client-local store.
///
/// This is a soft UX gate: the store is client-controlled and reads/writes are
/// not atomic across processes.
#[derive(Clone)]
pub struct UsageTracker {
    store: NamespacedStore,
    daily_cap: u32,
    window: Duration,
}

impl UsageTracker {
    pub fn new(store: NamespacedStore, daily_cap: u32, window: Duration) -> Self {
        Self {
            store,
            daily_cap,
            window,
        }
    }

    pub fn from_settings(store: NamespacedStore, settings: &UsageSettings) -> Self {
        Self::new(store, settings.daily_cap, settings.window())
    }

    pub fn daily_cap(&self) -> u32 {
        self.daily_cap
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check_limit(&self, identity: &Identity) -> Allowance {
        self.check_limit_at(identity, Utc::now())
    }

    pub fn check_limit_at(&self, identity: &Identity, now: DateTime<Utc>) -> Allowance {
        match self.active_record(identity, now) {
            None => Allowance::granted(),
            Some(record) if record.count < self.cap_for(&record) => Allowance::granted(),
            Some(record) => Allowance::denied(record.time_until_reset(now, self.window)),
        }
    }

    pub fn consume(&self, identity: &Identity) -> Result<UsageRecord> {
        self.consume_at(identity, Utc::now())
    }

    /// Records one generation. Starts a new window when the previous one is
    /// absent or expired.
    pub fn consume_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<UsageRecord> {
        let mut record = self
            .active_record(identity, now)
            .unwrap_or_else(|| UsageRecord::open(now));
        record.count = record.count.saturating_add(1);

        self.store.write(&self.key(identity), &record)?;
        tracing::debug!(
            "Usage for {}: {}/{}",
            identity,
            record.count,
            self.cap_for(&record)
        );
        Ok(record)
    }

    /// Generations still available in the current window.
    pub fn remaining_at(&self, identity: &Identity, now: DateTime<Utc>) -> u32 {
        match self.active_record(identity, now) {
            None => self.daily_cap,
            Some(record) => self.cap_for(&record).saturating_sub(record.count),
        }
    }

    pub fn remaining(&self, identity: &Identity) -> u32 {
        self.remaining_at(identity, Utc::now())
    }

    pub fn grant_bonus_credit(&self, identity: &Identity) -> Result<UsageRecord> {
        self.grant_bonus_credit_at(identity, Utc::now())
    }

    /// Raises this window's cap by one.
    pub fn grant_bonus_credit_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let mut record = self
            .active_record(identity, now)
            .unwrap_or_else(|| UsageRecord::open(now));
        record.bonus_credits = record.bonus_credits.saturating_add(1);

        self.store.write(&self.key(identity), &record)?;
        tracing::info!("Granted bonus credit to {}", identity);
        Ok(record)
    }

    /// Current, unexpired record for `identity`.
    pub fn active_record(&self, identity: &Identity, now: DateTime<Utc>) -> Option<UsageRecord> {
        self.store
            .read::<UsageRecord>(&self.key(identity))
            .filter(|record| !record.is_expired(now, self.window))
    }

    fn cap_for(&self, record: &UsageRecord) -> u32 {
        self.daily_cap.saturating_add(record.bonus_credits)
    }

    fn key(&self, identity: &Identity) -> String {
        self.store.key(USAGE_KIND, identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStore, MemoryLocalStore};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn tracker() -> (UsageTracker, Arc<MemoryLocalStore>) {
        let backing = Arc::new(MemoryLocalStore::new());
        let store = NamespacedStore::new(backing.clone(), "headshot");
        (UsageTracker::new(store, 3, Duration::hours(24)), backing)
    }

    #[test]
    fn test_fresh_identity_is_allowed() {
        let (tracker, _) = tracker();
        let allowance = tracker.check_limit_at(&Identity::Anonymous, t0());
        assert!(allowance.allowed);
        assert!(allowance.retry_after.is_none());
        assert_eq!(tracker.remaining_at(&Identity::Anonymous, t0()), 3);
    }

    #[test]
    fn test_denied_once_cap_reached() {
        let (tracker, _) = tracker();
        let id = Identity::Anonymous;

        for i in 0..3 {
            assert!(tracker.check_limit_at(&id, t0()).allowed);
            tracker.consume_at(&id, t0() + Duration::minutes(i)).unwrap();
        }

        let allowance = tracker.check_limit_at(&id, t0() + Duration::hours(2));
        assert!(!allowance.allowed);
        assert_eq!(allowance.retry_after, Some(Duration::hours(22)));
        assert_eq!(tracker.remaining_at(&id, t0() + Duration::hours(2)), 0);
    }

    #[test]
    fn test_lazy_reset_after_window() {
        let (tracker, _) = tracker();
        let id = Identity::User("u1".into());
        for _ in 0..3 {
            tracker.consume_at(&id, t0()).unwrap();
        }
        assert!(!tracker.check_limit_at(&id, t0() + Duration::hours(24)).allowed);

        let later = t0() + Duration::hours(24) + Duration::seconds(1);
        assert!(tracker.check_limit_at(&id, later).allowed);

        let record = tracker.consume_at(&id, later).unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.window_start, later);
    }

    #[test]
    fn test_consume_increments_within_window() {
        let (tracker, _) = tracker();
        let id = Identity::Anonymous;
        let first = tracker.consume_at(&id, t0()).unwrap();
        let second = tracker.consume_at(&id, t0() + Duration::hours(1)).unwrap();

        assert_eq!(first.count, 1);
        assert_eq!(second.count, 2);
        assert_eq!(second.window_start, t0());
    }

    #[test]
    fn test_consume_recovers_from_corrupt_record() {
        let (tracker, backing) = tracker();
        backing
            .set("headshot_usage_anonymous", "garbage".to_string())
            .unwrap();

        let record = tracker.consume_at(&Identity::Anonymous, t0()).unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.window_start, t0());
    }

    #[test]
    fn test_identities_are_isolated() {
        let (tracker, _) = tracker();
        for _ in 0..3 {
            tracker.consume_at(&Identity::User("a".into()), t0()).unwrap();
        }
        assert!(!tracker.check_limit_at(&Identity::User("a".into()), t0()).allowed);
        assert!(tracker.check_limit_at(&Identity::User("b".into()), t0()).allowed);
        assert!(tracker.check_limit_at(&Identity::Anonymous, t0()).allowed);
    }

    #[test]
    fn test_bonus_credit_lifts_cap() {
        let (tracker, _) = tracker();
        let id = Identity::Anonymous;
        for _ in 0..3 {
            tracker.consume_at(&id, t0()).unwrap();
        }
        assert!(!tracker.check_limit_at(&id, t0()).allowed);

        tracker.grant_bonus_credit_at(&id, t0()).unwrap();
        assert!(tracker.check_limit_at(&id, t0()).allowed);
        assert_eq!(tracker.remaining_at(&id, t0()), 1);

        tracker.consume_at(&id, t0()).unwrap();
        assert!(!tracker.check_limit_at(&id, t0()).allowed);
    }

    #[test]
    fn test_clearing_store_resets_quota() {
        let (tracker, backing) = tracker();
        for _ in 0..3 {
            tracker.consume_at(&Identity::Anonymous, t0()).unwrap();
        }
        backing.clear();
        assert!(tracker.check_limit_at(&Identity::Anonymous, t0()).allowed);
    }
}
