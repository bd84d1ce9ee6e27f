//! Transaction-fingerprint dedup entries and payment-identifier idempotency
//! entries. See spec §4.4 (Dedup & Idempotency Store).

use crate::chain::TxStatus;
use crate::money::Amount;
use crate::timestamp::UnixTimestamp;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// TTL for a transaction-fingerprint dedup entry. Spec §4.4.
pub const DEDUP_TTL_SECONDS: u64 = 300;

/// TTL for a client-chosen payment-identifier idempotency entry. Spec §4.4.
pub const PAYMENT_ID_TTL_SECONDS: u64 = 300;

/// A previously-seen transaction, keyed by its fingerprint (spec §4.4: a hash
/// of sender + recipient + amount + nonce, not the txid, so that identical
/// resubmissions are caught before broadcast).
#[derive(Debug, Clone)]
pub struct DedupEntry {
    pub txid: Option<String>,
    pub receipt_id: Option<Uuid>,
    pub status: TxStatus,
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
    pub block_height: Option<u64>,
    pub sponsored_tx: Option<String>,
    pub recorded_at: UnixTimestamp,
}

/// A client-chosen payment identifier bound to the payload it was first seen
/// with, so a retried request with the same identifier gets back the cached
/// response instead of re-executing the pipeline. Spec §4.4 / §4.7.
#[derive(Debug, Clone)]
pub struct PaymentIdEntry {
    pub payload_hash: String,
    pub cached_response: serde_json::Value,
    pub recorded_at: UnixTimestamp,
}

static PAYMENT_IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{16,128}$").expect("static regex is valid"));

/// Validates a caller-supplied payment identifier: 16-128 characters from
/// `[A-Za-z0-9_-]`. Spec §3 ("Payment identifier").
pub fn payment_identifier_valid(id: &str) -> bool {
    PAYMENT_IDENTIFIER_PATTERN.is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_identifiers() {
        assert!(payment_identifier_valid(&"a".repeat(16)));
        assert!(payment_identifier_valid(&"a".repeat(128)));
        assert!(payment_identifier_valid("abc123_XYZ-789012"));
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        assert!(!payment_identifier_valid(&"a".repeat(15)));
        assert!(!payment_identifier_valid(&"a".repeat(129)));
        assert!(!payment_identifier_valid(""));
    }

    #[test]
    fn rejects_disallowed_characters() {
        let with_space = format!("{} id", "a".repeat(16));
        assert!(!payment_identifier_valid(&with_space));
        assert!(!payment_identifier_valid(&format!("{}!", "a".repeat(16))));
    }
}
