//! Bonus-credit flows: social share and timed ad.
//!
//! Both end in `UsageTracker::grant_bonus_credit`, which raises the current
//! window's cap by one.

use chrono::{DateTime, Duration, Utc};
use headshot_core::config::CreditSettings;
use headshot_core::credit::{
    AdRewardLedger, AdViewSession, ShareFlow, ShareLedger, SharePlatform, ShareState,
};
use headshot_core::storage::NamespacedStore;
use headshot_core::usage::{UsageRecord, UsageTracker};
use headshot_core::{HeadshotError, Identity, Result};
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_CAPTION: &str = "I just made a professional headshot with AI in seconds!";

pub struct CreditService {
    usage: Arc<UsageTracker>,
    shares: ShareLedger,
    ads: AdRewardLedger,
    share_link: String,
    /// Serializes check-then-grant so two confirmations cannot both pass.
    claims: Mutex<()>,
}

impl CreditService {
    pub fn new(usage: Arc<UsageTracker>, store: NamespacedStore, settings: &CreditSettings) -> Self {
        let window = usage.window();
        Self {
            shares: ShareLedger::new(store.clone(), settings.share_cooldown()),
            ads: AdRewardLedger::new(store, settings.ad_min_watch(), settings.ads_per_day, window),
            usage,
            share_link: settings.share_url.clone(),
            claims: Mutex::new(()),
        }
    }

    fn claim_guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.claims
            .lock()
            .map_err(|e| HeadshotError::internal(format!("Credit lock poisoned: {e}")))
    }

    pub fn ad_min_watch(&self) -> chrono::Duration {
        self.ads.min_watch()
    }

    /// Opens a share flow. An identity still in cooldown gets a flow in
    /// `Ineligible` state pointing at the ad fallback.
    pub fn start_share(
        &self,
        identity: &Identity,
        platform: SharePlatform,
        caption: Option<&str>,
    ) -> Result<ShareFlow> {
        let mut flow = ShareFlow::new();
        let eligibility = self.shares.check_eligibility(identity, platform);
        flow.begin(
            identity,
            platform,
            eligibility,
            &self.share_link,
            caption.unwrap_or(DEFAULT_CAPTION),
        )?;

        if let ShareState::Ineligible { retry_after, .. } = flow.state() {
            tracing::info!(
                "[Credits] {} shared on {} recently, next share in {}s",
                identity,
                platform,
                retry_after.num_seconds()
            );
        }
        Ok(flow)
    }

    /// Self-reported share confirmation. Stamps the platform cooldown and
    /// grants one credit.
    ///
    /// Eligibility is checked again here: another flow for the same platform
    /// may have been confirmed since this one started.
    pub fn confirm_share(&self, identity: &Identity, flow: &mut ShareFlow) -> Result<UsageRecord> {
        let _claim = self.claim_guard()?;

        if let Some(intent) = flow.pending_intent().filter(|i| &i.identity == identity) {
            let eligibility = self.shares.check_eligibility(identity, intent.platform);
            if !eligibility.allowed {
                tracing::info!(
                    "[Credits] {} already earned a credit on {} in this cooldown",
                    identity,
                    intent.platform
                );
                return Err(HeadshotError::QuotaExceeded {
                    retry_after: eligibility.retry_after.unwrap_or_else(Duration::zero),
                });
            }
        }

        if matches!(flow.state(), ShareState::Sharing(_)) {
            flow.mark_opened()?;
        }
        let platform = flow.confirm(identity)?;
        self.shares.record_share(identity, platform)?;
        let record = self.usage.grant_bonus_credit(identity)?;
        tracing::info!("[Credits] {} earned a credit by sharing on {}", identity, platform);
        Ok(record)
    }

    pub fn start_ad_view(&self, identity: &Identity) -> Result<AdViewSession> {
        self.start_ad_view_at(identity, Utc::now())
    }

    pub fn start_ad_view_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<AdViewSession> {
        self.ads.start_at(identity, now)
    }

    pub fn complete_ad_view(&self, session: &AdViewSession) -> Result<UsageRecord> {
        self.complete_ad_view_at(session, Utc::now())
    }

    /// Grants one credit if the ad was watched long enough and the daily ad
    /// allowance is not used up.
    pub fn complete_ad_view_at(
        &self,
        session: &AdViewSession,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let _claim = self.claim_guard()?;
        self.ads.complete_at(session, now)?;
        let record = self.usage.grant_bonus_credit_at(&session.identity, now)?;
        tracing::info!("[Credits] {} earned a credit by watching an ad", session.identity);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headshot_core::credit::CreditFallback;
    use headshot_core::storage::MemoryLocalStore;

    fn service() -> CreditService {
        let store = NamespacedStore::new(Arc::new(MemoryLocalStore::new()), "test");
        let usage = Arc::new(UsageTracker::new(store.clone(), 3, Duration::hours(24)));
        CreditService::new(usage, store, &CreditSettings::default())
    }

    #[test]
    fn test_share_grants_credit_once_per_cooldown() {
        let credits = service();
        let identity = Identity::User("u1".into());

        let mut flow = credits
            .start_share(&identity, SharePlatform::Linkedin, None)
            .unwrap();
        match flow.state() {
            ShareState::Sharing(intent) => {
                assert!(intent.share_url.starts_with("https://www.linkedin.com/"));
                assert!(intent.clipboard_text.ends_with("https://headshot.studio"));
            }
            other => panic!("unexpected state {other:?}"),
        }

        let record = credits.confirm_share(&identity, &mut flow).unwrap();
        assert_eq!(record.bonus_credits, 1);
        assert_eq!(credits.usage.remaining(&identity), 4);

        let flow = credits
            .start_share(&identity, SharePlatform::Linkedin, None)
            .unwrap();
        assert!(matches!(
            flow.state(),
            ShareState::Ineligible {
                fallback: CreditFallback::WatchAd,
                ..
            }
        ));

        // Other platforms have their own cooldown.
        let flow = credits
            .start_share(&identity, SharePlatform::Twitter, None)
            .unwrap();
        assert!(matches!(flow.state(), ShareState::Sharing(_)));
    }

    #[test]
    fn test_cancelled_share_grants_nothing() {
        let credits = service();
        let identity = Identity::Anonymous;

        let mut flow = credits
            .start_share(&identity, SharePlatform::Facebook, Some("Look!"))
            .unwrap();
        flow.cancel().unwrap();

        assert!(credits.confirm_share(&identity, &mut flow).is_err());
        assert_eq!(credits.usage.remaining(&identity), 3);
    }

    #[test]
    fn test_parallel_share_flows_grant_one_credit() {
        let credits = service();
        let identity = Identity::User("u1".into());

        let mut first = credits
            .start_share(&identity, SharePlatform::Linkedin, None)
            .unwrap();
        let mut second = credits
            .start_share(&identity, SharePlatform::Linkedin, None)
            .unwrap();

        credits.confirm_share(&identity, &mut first).unwrap();
        let err = credits.confirm_share(&identity, &mut second).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(credits.usage.remaining(&identity), 4);
    }

    #[test]
    fn test_share_confirmed_by_other_account_is_rejected() {
        let credits = service();
        let owner = Identity::User("a".into());
        let other = Identity::User("b".into());

        let mut flow = credits
            .start_share(&owner, SharePlatform::Twitter, None)
            .unwrap();
        let err = credits.confirm_share(&other, &mut flow).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(credits.usage.remaining(&other), 3);
        assert_eq!(credits.usage.remaining(&owner), 3);

        // The owner can still finish it.
        credits.confirm_share(&owner, &mut flow).unwrap();
        assert_eq!(credits.usage.remaining(&owner), 4);
    }

    #[test]
    fn test_replayed_ad_session_grants_once() {
        let credits = service();
        let identity = Identity::Anonymous;
        let start = Utc::now();

        let session = credits.start_ad_view_at(&identity, start).unwrap();
        credits
            .complete_ad_view_at(&session, start + Duration::seconds(15))
            .unwrap();
        let err = credits
            .complete_ad_view_at(&session, start + Duration::seconds(16))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(credits.usage.remaining_at(&identity, start), 4);
    }

    #[test]
    fn test_ad_view_needs_full_watch() {
        let credits = service();
        let identity = Identity::Anonymous;
        let start = Utc::now();

        let session = credits.start_ad_view_at(&identity, start).unwrap();
        let err = credits
            .complete_ad_view_at(&session, start + Duration::seconds(5))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(credits.usage.remaining(&identity), 3);

        let record = credits
            .complete_ad_view_at(&session, start + Duration::seconds(15))
            .unwrap();
        assert_eq!(record.bonus_credits, 1);
    }

    #[test]
    fn test_ad_credits_capped_per_day() {
        let credits = service();
        let identity = Identity::Anonymous;
        let start = Utc::now();

        for _ in 0..3 {
            let session = credits.start_ad_view_at(&identity, start).unwrap();
            credits
                .complete_ad_view_at(&session, start + Duration::seconds(20))
                .unwrap();
        }

        let err = credits.start_ad_view_at(&identity, start).unwrap_err();
        assert!(matches!(err, HeadshotError::QuotaExceeded { .. }));
        assert_eq!(credits.usage.remaining_at(&identity, start), 6);
    }
}
