//! API key metadata and per-tier rate/spend limits. See spec §4.7 step 1
//! ("authenticate caller") and §3 ("Tier limits").

use crate::timestamp::UnixTimestamp;
use serde::{Deserialize, Serialize};

/// The service tiers an API key can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Standard,
    Premium,
}

/// Request-rate and daily-spend ceilings attached to a [`Tier`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLimits {
    pub requests_per_minute: u32,
    pub daily_requests: u32,
    pub daily_fee_cap: u128,
}

impl Tier {
    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Free => TierLimits {
                requests_per_minute: 5,
                daily_requests: 200,
                daily_fee_cap: 5_000_000,
            },
            Tier::Standard => TierLimits {
                requests_per_minute: 30,
                daily_requests: 5_000,
                daily_fee_cap: 100_000_000,
            },
            Tier::Premium => TierLimits {
                requests_per_minute: 120,
                daily_requests: 100_000,
                daily_fee_cap: 2_000_000_000,
            },
        }
    }
}

/// Metadata the relay keeps about a registered API key.
#[derive(Debug, Clone)]
pub struct ApiKeyMetadata {
    pub key_id: String,
    pub tier: Tier,
    pub expires_at: Option<UnixTimestamp>,
    pub active: bool,
}

impl ApiKeyMetadata {
    pub fn is_usable(&self, now: UnixTimestamp) -> bool {
        self.active && !self.expires_at.is_some_and(|expiry| expiry.is_past(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_have_increasing_limits() {
        let free = Tier::Free.limits();
        let standard = Tier::Standard.limits();
        let premium = Tier::Premium.limits();
        assert!(free.requests_per_minute < standard.requests_per_minute);
        assert!(standard.requests_per_minute < premium.requests_per_minute);
        assert!(free.daily_fee_cap < standard.daily_fee_cap);
        assert!(standard.daily_fee_cap < premium.daily_fee_cap);
    }

    #[test]
    fn usable_requires_active_and_unexpired() {
        let now = UnixTimestamp(1_000);
        let active = ApiKeyMetadata {
            key_id: "key1".to_string(),
            tier: Tier::Free,
            expires_at: None,
            active: true,
        };
        assert!(active.is_usable(now));

        let expired = ApiKeyMetadata {
            key_id: "key2".to_string(),
            tier: Tier::Free,
            expires_at: Some(UnixTimestamp(999)),
            active: true,
        };
        assert!(!expired.is_usable(now));

        let deactivated = ApiKeyMetadata {
            key_id: "key3".to_string(),
            tier: Tier::Free,
            expires_at: None,
            active: false,
        };
        assert!(!deactivated.is_usable(now));
    }
}
