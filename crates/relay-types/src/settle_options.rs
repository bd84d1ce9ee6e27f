//! Declared payment requirements ("settle options"), spec §3.

use crate::money::{Amount, AmountParseError};
use serde::{Deserialize, Serialize};

/// The token families the relay can verify payments in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Native,
    BridgedBtc,
    Stablecoin,
}

impl Default for TokenType {
    fn default() -> Self {
        TokenType::Native
    }
}

/// Wire shape of settle options, before validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettleOptions {
    pub expected_recipient: String,
    pub min_amount: String,
    #[serde(default)]
    pub token_type: TokenType,
    #[serde(default)]
    pub expected_sender: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub max_timeout_seconds: Option<u64>,
}

/// Validated payment requirements a candidate transaction must satisfy.
///
/// See spec §3 invariants: `minAmount` parses as a non-negative integer,
/// `tokenType` is in the supported set, recipient comparison is
/// case-insensitive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleOptions {
    pub expected_recipient: String,
    pub min_amount: Amount,
    pub token_type: TokenType,
    pub expected_sender: Option<String>,
    pub resource: Option<String>,
    pub method: Option<String>,
    pub max_timeout_seconds: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettleOptionsError {
    #[error("expectedRecipient must not be empty")]
    MissingRecipient,
    #[error("minAmount is invalid: {0}")]
    InvalidMinAmount(#[from] AmountParseError),
    #[error("minAmount must be positive")]
    ZeroMinAmount,
}

impl SettleOptions {
    pub fn validate(raw: RawSettleOptions) -> Result<Self, SettleOptionsError> {
        if raw.expected_recipient.trim().is_empty() {
            return Err(SettleOptionsError::MissingRecipient);
        }
        let min_amount: Amount = raw.min_amount.parse()?;
        if min_amount == Amount::zero() {
            return Err(SettleOptionsError::ZeroMinAmount);
        }
        Ok(SettleOptions {
            expected_recipient: raw.expected_recipient,
            min_amount,
            token_type: raw.token_type,
            expected_sender: raw.expected_sender,
            resource: raw.resource,
            method: raw.method,
            max_timeout_seconds: raw.max_timeout_seconds,
        })
    }

    /// Case-insensitive recipient comparison, per spec §3 invariant.
    pub fn recipient_matches(&self, candidate: &str) -> bool {
        self.expected_recipient.eq_ignore_ascii_case(candidate)
    }

    /// The caller-supplied poll budget, capped per spec §4.6: `maxPollMs`
    /// must never exceed `(caller timeout - 5s)`, and overall never exceeds 60s.
    pub fn max_poll_duration(&self) -> std::time::Duration {
        let caller_budget = self
            .max_timeout_seconds
            .map(|secs| secs.saturating_sub(5))
            .unwrap_or(60);
        std::time::Duration::from_secs(caller_budget.min(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(min_amount: &str) -> RawSettleOptions {
        RawSettleOptions {
            expected_recipient: "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".to_string(),
            min_amount: min_amount.to_string(),
            token_type: TokenType::Native,
            expected_sender: None,
            resource: None,
            method: None,
            max_timeout_seconds: None,
        }
    }

    #[test]
    fn validates_well_formed_options() {
        let options = SettleOptions::validate(raw("1000")).unwrap();
        assert_eq!(options.min_amount.0, 1000);
    }

    #[test]
    fn rejects_empty_recipient() {
        let mut r = raw("1000");
        r.expected_recipient = "  ".to_string();
        assert!(matches!(
            SettleOptions::validate(r),
            Err(SettleOptionsError::MissingRecipient)
        ));
    }

    #[test]
    fn rejects_malformed_min_amount() {
        assert!(SettleOptions::validate(raw("-5")).is_err());
        assert!(SettleOptions::validate(raw("five")).is_err());
    }

    #[test]
    fn zero_min_amount_is_rejected() {
        // spec §8 boundary: minAmount=0 is rejected "iff tokenType requires
        // positive amount (currently always)".
        assert!(matches!(
            SettleOptions::validate(raw("0")),
            Err(SettleOptionsError::ZeroMinAmount)
        ));
    }

    #[test]
    fn recipient_comparison_is_case_insensitive() {
        let options = SettleOptions::validate(raw("1")).unwrap();
        assert!(options.recipient_matches("sp2j6zy48gv1ez5v2v5rb9mp66sw86pykknrv9ej7"));
    }

    #[test]
    fn max_poll_duration_reserves_five_seconds_and_caps_at_sixty() {
        let mut r = raw("1");
        r.max_timeout_seconds = Some(10);
        let options = SettleOptions::validate(r).unwrap();
        assert_eq!(options.max_poll_duration().as_secs(), 5);

        let mut r2 = raw("1");
        r2.max_timeout_seconds = Some(1000);
        let options2 = SettleOptions::validate(r2).unwrap();
        assert_eq!(options2.max_poll_duration().as_secs(), 60);
    }
}
