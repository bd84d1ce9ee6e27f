//! Non-negative smallest-unit integer amounts.
//!
//! Settlement amounts in this protocol are always expressed as integer
//! strings in the smallest on-chain unit (no decimals, unlike the teacher's
//! [`MoneyAmount`](https://docs.rs/x402-rs) which parses human currency
//! strings). [`Amount`] is the equivalent for this domain: strict digit-only
//! parsing into a `u128`, rejecting sign, whitespace and thousands separators.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An amount in the smallest on-chain unit (e.g. micro-STX, sats of bridged BTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub u128);

#[derive(Debug, thiserror::Error)]
pub enum AmountParseError {
    #[error("amount must be a non-negative integer")]
    InvalidFormat,
    #[error("amount overflows u128")]
    Overflow,
}

impl Amount {
    pub fn zero() -> Self {
        Amount(0)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountParseError::InvalidFormat);
        }
        let value = s.parse::<u128>().map_err(|_| AmountParseError::Overflow)?;
        Ok(Amount(value))
    }
}

impl TryFrom<&str> for Amount {
    type Error = AmountParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Amount::from_str(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value as u128)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_digits() {
        assert_eq!(Amount::from_str("1000").unwrap(), Amount(1000));
        assert_eq!(Amount::from_str("0").unwrap(), Amount(0));
    }

    #[test]
    fn rejects_sign_and_decimals() {
        assert!(Amount::from_str("-1").is_err());
        assert!(Amount::from_str("+1").is_err());
        assert!(Amount::from_str("1.5").is_err());
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("1,000").is_err());
    }

    #[test]
    fn ordering_matches_numeric_value() {
        assert!(Amount(999) < Amount(1000));
        assert!(Amount::from_str("1000").unwrap() >= Amount::from_str("1000").unwrap());
    }
}
