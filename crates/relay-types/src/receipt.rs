//! Sponsorship receipts: the record a successful `/sponsor` call hands back
//! so a later `/settle`/`/verify` call can redeem it exactly once.
//!
//! See spec §4.4 (Receipt Store) and §3 ("Receipt"). Atomic consumption is
//! implemented by the store, not here (see `relay-core::receipt_store`);
//! this module only defines the data shape.

use crate::money::Amount;
use crate::settle_options::SettleOptions;
use crate::timestamp::UnixTimestamp;
use serde::Serialize;
use uuid::Uuid;

/// Receipts are redeemable for one hour after issuance. Spec §4.4.
pub const RECEIPT_TTL_SECONDS: u64 = 3600;

/// A sponsorship receipt: a sponsored-but-unbroadcast (or already broadcast,
/// depending on pipeline variant) transaction bound to the settle options it
/// was validated against.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_id: Uuid,
    pub created_at: UnixTimestamp,
    pub expires_at: UnixTimestamp,
    pub sender_address: String,
    pub sponsored_tx_hex: String,
    pub fee: u64,
    pub txid: Option<String>,
    #[serde(skip)]
    pub settle_options: SettleOptions,
    pub consumed: bool,
    pub access_count: u32,
}

impl Receipt {
    pub fn new(
        sender_address: String,
        sponsored_tx_hex: String,
        fee: u64,
        settle_options: SettleOptions,
        now: UnixTimestamp,
    ) -> Self {
        Receipt {
            receipt_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + RECEIPT_TTL_SECONDS,
            sender_address,
            sponsored_tx_hex,
            fee,
            txid: None,
            settle_options,
            consumed: false,
            access_count: 0,
        }
    }

    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        self.expires_at.is_past(now)
    }

    pub fn min_amount(&self) -> Amount {
        self.settle_options.min_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settle_options::TokenType;

    fn sample_options() -> SettleOptions {
        SettleOptions {
            expected_recipient: "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".to_string(),
            min_amount: Amount(1000),
            token_type: TokenType::Native,
            expected_sender: None,
            resource: None,
            method: None,
            max_timeout_seconds: None,
        }
    }

    #[test]
    fn expires_one_hour_after_creation() {
        let now = UnixTimestamp(1_000);
        let receipt = Receipt::new("SP_SENDER".to_string(), "00".to_string(), 200, sample_options(), now);
        assert_eq!(receipt.expires_at, UnixTimestamp(1_000 + RECEIPT_TTL_SECONDS));
        assert!(!receipt.is_expired(now));
        assert!(receipt.is_expired(receipt.expires_at));
    }

    #[test]
    fn starts_unconsumed_with_no_txid() {
        let receipt = Receipt::new("SP_SENDER".to_string(), "00".to_string(), 200, sample_options(), UnixTimestamp(0));
        assert!(!receipt.consumed);
        assert!(receipt.txid.is_none());
        assert_eq!(receipt.access_count, 0);
    }
}
