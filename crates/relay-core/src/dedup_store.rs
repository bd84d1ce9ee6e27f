//! Content-addressed tx-fingerprint dedup and client-supplied
//! payment-identifier idempotency. Spec §4.4.
//!
//! Grounded on the wider pack's DashMap-backed TTL caches (e.g.
//! `danipolo-liquidator-rust`'s `LiqdClient` route cache): a concurrent map
//! keyed by the content hash, with a background sweep evicting expired
//! entries rather than checking expiry lazily on every read.

use dashmap::DashMap;
use relay_types::dedup::{DedupEntry, PaymentIdEntry, DEDUP_TTL_SECONDS, PAYMENT_ID_TTL_SECONDS};
use relay_types::timestamp::UnixTimestamp;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Computes the tx fingerprint: SHA-256 of the normalized (lowercase, no
/// `0x` prefix) transaction hex. Spec §3 "Sponsored transaction (wire)".
pub fn tx_fingerprint(tx_hex: &str) -> String {
    let normalized = tx_hex.trim_start_matches("0x").to_ascii_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    hex::encode(digest)
}

pub enum PaymentIdLookup {
    /// No entry for this identifier: the pipeline should proceed.
    Miss,
    /// The identifier was used before with the exact same payload: replay
    /// the cached response.
    Hit(serde_json::Value),
    /// The identifier was used before with a *different* payload.
    /// Spec §4.4: `PAYMENT_IDENTIFIER_CONFLICT`.
    Conflict,
}

pub struct DedupStore {
    dedup: Arc<DashMap<String, (DedupEntry, UnixTimestamp)>>,
    payment_ids: Arc<DashMap<String, (PaymentIdEntry, UnixTimestamp)>>,
}

impl DedupStore {
    pub fn new() -> Self {
        let dedup = Arc::new(DashMap::new());
        let payment_ids = Arc::new(DashMap::new());
        spawn_sweeper(dedup.clone(), payment_ids.clone());
        DedupStore { dedup, payment_ids }
    }

    pub fn check_dedup(&self, tx_hex: &str) -> Option<DedupEntry> {
        let key = tx_fingerprint(tx_hex);
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        self.dedup.get(&key).and_then(|entry| {
            if entry.1.is_past(now) { None } else { Some(entry.0.clone()) }
        })
    }

    pub fn record_dedup(&self, tx_hex: &str, entry: DedupEntry) {
        let key = tx_fingerprint(tx_hex);
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        self.dedup.insert(key, (entry, now + DEDUP_TTL_SECONDS));
    }

    pub fn check_payment_id(&self, id: &str, payload_hash: &str) -> PaymentIdLookup {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        match self.payment_ids.get(id) {
            Some(entry) if entry.1.is_past(now) => PaymentIdLookup::Miss,
            Some(entry) if entry.0.payload_hash == payload_hash => {
                PaymentIdLookup::Hit(entry.0.cached_response.clone())
            }
            Some(_) => PaymentIdLookup::Conflict,
            None => PaymentIdLookup::Miss,
        }
    }

    pub fn record_payment_id(&self, id: &str, payload_hash: String, response: serde_json::Value) {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        let entry = PaymentIdEntry { payload_hash, cached_response: response, recorded_at: now };
        self.payment_ids.insert(id.to_string(), (entry, now + PAYMENT_ID_TTL_SECONDS));
    }
}

impl Default for DedupStore {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_sweeper(
    dedup: Arc<DashMap<String, (DedupEntry, UnixTimestamp)>>,
    payment_ids: Arc<DashMap<String, (PaymentIdEntry, UnixTimestamp)>>,
) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(30));
        loop {
            tick.tick().await;
            let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
            dedup.retain(|_, (_, expires_at)| !expires_at.is_past(now));
            payment_ids.retain(|_, (_, expires_at)| !expires_at.is_past(now));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::chain::TxStatus;
    use relay_types::money::Amount;

    fn sample_entry() -> DedupEntry {
        DedupEntry {
            txid: Some("0xAA".to_string()),
            receipt_id: None,
            status: TxStatus::Pending,
            sender: "SP_SENDER".to_string(),
            recipient: "SP_RECIPIENT".to_string(),
            amount: Amount(1000),
            block_height: None,
            sponsored_tx: None,
            recorded_at: UnixTimestamp::try_now().unwrap(),
        }
    }

    #[test]
    fn fingerprint_is_stable_across_case_and_prefix() {
        assert_eq!(tx_fingerprint("0xAABB"), tx_fingerprint("aabb"));
        assert_eq!(tx_fingerprint("AABB"), tx_fingerprint("aabb"));
    }

    #[test]
    fn dedup_hit_returns_recorded_entry() {
        let store = DedupStore::new();
        assert!(store.check_dedup("aabb").is_none());
        store.record_dedup("aabb", sample_entry());
        let hit = store.check_dedup("aabb").expect("entry should be present");
        assert_eq!(hit.txid.as_deref(), Some("0xAA"));
    }

    #[test]
    fn payment_id_distinguishes_hit_from_conflict() {
        let store = DedupStore::new();
        assert!(matches!(store.check_payment_id("pay_1", "hashA"), PaymentIdLookup::Miss));
        store.record_payment_id("pay_1", "hashA".to_string(), serde_json::json!({"ok": true}));
        assert!(matches!(store.check_payment_id("pay_1", "hashA"), PaymentIdLookup::Hit(_)));
        assert!(matches!(store.check_payment_id("pay_1", "hashB"), PaymentIdLookup::Conflict));
    }
}
