//! Per-API-key daily request and fee-spend quota. Spec §2 "rate/quota
//! check"; §4.7 step 10 "record usage + fee against the caller's API key".
//!
//! Same DashMap-backed-per-key-window idiom as [`crate::rate_limiter`], but
//! with a 24h window and two counters (requests, cumulative fee) instead of
//! one.

use dashmap::DashMap;
use relay_types::api_key::TierLimits;
use relay_types::timestamp::UnixTimestamp;
use std::time::Duration;

const DAY: Duration = Duration::from_secs(86_400);

struct Window {
    started_at: UnixTimestamp,
    requests: u32,
    fee_spent: u128,
}

/// Why a quota check failed, distinguishing the two dead codes the review
/// flagged: `DailyLimitExceeded` (request count) vs `SpendingCapExceeded`
/// (cumulative fee).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDenied {
    DailyRequestsExceeded,
    DailyFeeCapExceeded,
}

pub struct QuotaTracker {
    windows: DashMap<String, Window>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        QuotaTracker { windows: DashMap::new() }
    }

    fn reset_if_expired(window: &mut Window, now: UnixTimestamp) {
        if now.0.saturating_sub(window.started_at.0) >= DAY.as_secs() {
            window.started_at = now;
            window.requests = 0;
            window.fee_spent = 0;
        }
    }

    /// Checks (without consuming) whether `key_id` has room for one more
    /// request under `limits`. Does not record usage -- the caller records
    /// actual fee spend only on broadcast success, via [`Self::record_usage`].
    pub fn check(&self, key_id: &str, limits: TierLimits) -> Result<(), QuotaDenied> {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        let mut window = self.windows.entry(key_id.to_string()).or_insert_with(|| Window {
            started_at: now,
            requests: 0,
            fee_spent: 0,
        });
        Self::reset_if_expired(&mut window, now);

        if window.requests >= limits.daily_requests {
            return Err(QuotaDenied::DailyRequestsExceeded);
        }
        if window.fee_spent >= limits.daily_fee_cap {
            return Err(QuotaDenied::DailyFeeCapExceeded);
        }
        Ok(())
    }

    /// Records one request and `fee` against `key_id`'s rolling window.
    /// Spec §4.7 step 10: called once, on broadcast success.
    pub fn record_usage(&self, key_id: &str, fee: u64) {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        let mut window = self.windows.entry(key_id.to_string()).or_insert_with(|| Window {
            started_at: now,
            requests: 0,
            fee_spent: 0,
        });
        Self::reset_if_expired(&mut window, now);
        window.requests += 1;
        window.fee_spent += fee as u128;
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(daily_requests: u32, daily_fee_cap: u128) -> TierLimits {
        TierLimits { requests_per_minute: 9999, daily_requests, daily_fee_cap }
    }

    #[test]
    fn allows_until_daily_request_cap_then_denies() {
        let tracker = QuotaTracker::new();
        let limits = limits(2, 1_000_000);
        assert!(tracker.check("key-a", limits).is_ok());
        tracker.record_usage("key-a", 10);
        assert!(tracker.check("key-a", limits).is_ok());
        tracker.record_usage("key-a", 10);
        assert_eq!(tracker.check("key-a", limits), Err(QuotaDenied::DailyRequestsExceeded));
    }

    #[test]
    fn denies_once_fee_cap_reached() {
        let tracker = QuotaTracker::new();
        let limits = limits(1000, 100);
        tracker.record_usage("key-a", 60);
        assert!(tracker.check("key-a", limits).is_ok());
        tracker.record_usage("key-a", 60);
        assert_eq!(tracker.check("key-a", limits), Err(QuotaDenied::DailyFeeCapExceeded));
    }

    #[test]
    fn keys_are_independent() {
        let tracker = QuotaTracker::new();
        let limits = limits(1, 1_000_000);
        tracker.record_usage("key-a", 10);
        assert!(tracker.check("key-a", limits).is_err());
        assert!(tracker.check("key-b", limits).is_ok());
    }
}
