//! Unix timestamp and TTL helpers.
//!
//! Grounded on the teacher's `UnixTimestamp`: a seconds-since-epoch value
//! serialized as a string on the wire to avoid precision loss in JSON.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::{Duration, SystemTime, SystemTimeError};

/// Seconds since the Unix epoch.
///
/// Used for `createdAt`/`expiresAt`/`recordedAt` fields across receipts,
/// dedup entries and nonce-pool bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(pub u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ts = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(UnixTimestamp(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0 + rhs)
    }
}

impl UnixTimestamp {
    pub fn try_now() -> Result<Self, SystemTimeError> {
        let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?.as_secs();
        Ok(Self(now))
    }

    pub fn seconds_since_epoch(&self) -> u64 {
        self.0
    }

    pub fn is_past(&self, now: UnixTimestamp) -> bool {
        self.0 <= now.0
    }

    pub fn plus_ttl(now: UnixTimestamp, ttl: Duration) -> Self {
        now + ttl.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json() {
        let ts = UnixTimestamp(1_700_000_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1700000000\"");
        let back: UnixTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn rejects_non_numeric_timestamp() {
        let err = serde_json::from_str::<UnixTimestamp>("\"not-a-number\"");
        assert!(err.is_err());
    }

    #[test]
    fn is_past_compares_inclusively() {
        let a = UnixTimestamp(100);
        let b = UnixTimestamp(100);
        assert!(a.is_past(b));
        assert!(!UnixTimestamp(101).is_past(b));
    }
}
