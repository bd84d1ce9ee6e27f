//! Per-agent sender rate limit. Spec §4.7 step 2.
//!
//! A token bucket per agent address, refilled to `MAX_REQ_PER_MIN` once the
//! 60 s window rolls over. Same DashMap-backed-concurrent-map idiom as
//! `dedup_store`, reused here because the access pattern (key by caller
//! identity, cheap concurrent read/update) is identical.

use dashmap::DashMap;
use relay_types::timestamp::UnixTimestamp;
use std::time::Duration;

/// Spec §4.7 step 2: `MAX_REQ_PER_MIN=10`.
pub const MAX_REQ_PER_MIN: u32 = 10;
const WINDOW: Duration = Duration::from_secs(60);

struct Bucket {
    window_started_at: UnixTimestamp,
    count: u32,
}

pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denied {
    pub retry_after: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter { buckets: DashMap::new(), limit: MAX_REQ_PER_MIN }
    }

    #[cfg(test)]
    fn with_limit(limit: u32) -> Self {
        RateLimiter { buckets: DashMap::new(), limit }
    }

    /// Checks and consumes one token for `agent`. Returns `Err(Denied)` with
    /// a `Retry-After` hint (seconds remaining in the window) on denial.
    pub fn check(&self, agent: &str) -> Result<(), Denied> {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        let mut bucket = self.buckets.entry(agent.to_string()).or_insert_with(|| Bucket {
            window_started_at: now,
            count: 0,
        });

        let elapsed = now.0.saturating_sub(bucket.window_started_at.0);
        if elapsed >= WINDOW.as_secs() {
            bucket.window_started_at = now;
            bucket.count = 0;
        }

        if bucket.count >= self.limit {
            let retry_after = WINDOW.as_secs().saturating_sub(elapsed).max(1);
            return Err(Denied { retry_after });
        }
        bucket.count += 1;
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_denies() {
        let limiter = RateLimiter::with_limit(3);
        assert!(limiter.check("agent-a").is_ok());
        assert!(limiter.check("agent-a").is_ok());
        assert!(limiter.check("agent-a").is_ok());
        assert!(limiter.check("agent-a").is_err());
    }

    #[test]
    fn buckets_are_independent_per_agent() {
        let limiter = RateLimiter::with_limit(1);
        assert!(limiter.check("agent-a").is_ok());
        assert!(limiter.check("agent-b").is_ok());
        assert!(limiter.check("agent-a").is_err());
    }

    #[test]
    fn denial_reports_a_positive_retry_after() {
        let limiter = RateLimiter::with_limit(1);
        limiter.check("agent-a").unwrap();
        let denied = limiter.check("agent-a").unwrap_err();
        assert!(denied.retry_after > 0 && denied.retry_after <= 60);
    }
}
