use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Consumption inside one rolling window.
///
/// Records are overwritten in place and never deleted: once
/// `now - window_start` exceeds the window the record is expired and every
/// reader treats it as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub count: u32,
    pub window_start: DateTime<Utc>,
    /// Extra allowance granted in this window (shares, ads).
    #[serde(default)]
    pub bonus_credits: u32,
}

impl UsageRecord {
    /// A fresh window opened at `now` with nothing consumed yet.
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
            bonus_credits: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.window_start > window
    }

    pub fn window_end(&self, window: Duration) -> DateTime<Utc> {
        self.window_start + window
    }

    /// Time left until the window rolls over, never negative.
    pub fn time_until_reset(&self, now: DateTime<Utc>, window: Duration) -> Duration {
        (self.window_end(window) - now).max(Duration::zero())
    }
}

/// Answer to "may this identity do one more X right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    pub allowed: bool,
    /// Set only when denied: how long until the window resets.
    pub retry_after: Option<Duration>,
}

impl Allowance {
    pub fn granted() -> Self {
        Self {
            allowed: true,
            retry_after: None,
        }
    }

    pub fn denied(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after: Some(retry_after),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_is_strictly_after_window() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let record = UsageRecord::open(start);
        let window = Duration::hours(24);

        assert!(!record.is_expired(start + Duration::hours(24), window));
        assert!(record.is_expired(start + Duration::hours(24) + Duration::seconds(1), window));
    }

    #[test]
    fn test_time_until_reset_clamps_to_zero() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let record = UsageRecord::open(start);
        let window = Duration::hours(24);

        assert_eq!(
            record.time_until_reset(start + Duration::hours(20), window),
            Duration::hours(4)
        );
        assert_eq!(
            record.time_until_reset(start + Duration::hours(30), window),
            Duration::zero()
        );
    }

    #[test]
    fn test_record_without_bonus_field_deserializes() {
        let record: UsageRecord =
            serde_json::from_str(r#"{"count":2,"windowStart":"2026-01-01T08:00:00Z"}"#).unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.bonus_credits, 0);
    }
}
