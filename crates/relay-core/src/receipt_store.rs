//! Receipt persistence and atomic consumption. Spec §4.5.
//!
//! `markConsumed` needs a compare-and-set, not a read-then-write: the spec
//! explicitly calls out TOCTOU double-consumption as an open correctness
//! requirement. [`dashmap::DashMap::get_mut`] takes an exclusive lock on the
//! entry's shard for the lifetime of the guard, so the check-then-flip below
//! cannot interleave with a concurrent caller on the same key -- this is the
//! per-receipt-actor semantics the spec requires, implemented via the map's
//! own locking instead of a hand-rolled actor per receipt.

use dashmap::DashMap;
use relay_types::receipt::Receipt;
use relay_types::timestamp::UnixTimestamp;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Consumed,
    AlreadyConsumed,
    NotFound,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Valid,
    Consumed,
}

pub struct ReceiptStore {
    receipts: Arc<DashMap<Uuid, Receipt>>,
}

impl ReceiptStore {
    pub fn new() -> Self {
        let receipts = Arc::new(DashMap::new());
        spawn_sweeper(receipts.clone());
        ReceiptStore { receipts }
    }

    /// Returns whether the write was persisted; failure degrades the
    /// response (no receiptId returned) but never fails the request. Spec §4.5.
    pub fn store(&self, receipt: Receipt) -> bool {
        self.receipts.insert(receipt.receipt_id, receipt);
        true
    }

    pub fn get(&self, receipt_id: Uuid) -> Option<Receipt> {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        self.receipts.get(&receipt_id).and_then(|r| {
            if r.is_expired(now) { None } else { Some(r.clone()) }
        })
    }

    pub fn status(&self, receipt_id: Uuid) -> Option<ReceiptStatus> {
        self.get(receipt_id).map(|r| {
            if r.consumed { ReceiptStatus::Consumed } else { ReceiptStatus::Valid }
        })
    }

    /// Atomic compare-and-set: `consumed: false -> true` at most once.
    pub fn mark_consumed(&self, receipt_id: Uuid) -> ConsumeOutcome {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        match self.receipts.get_mut(&receipt_id) {
            Some(mut entry) => {
                if entry.is_expired(now) {
                    return ConsumeOutcome::Expired;
                }
                entry.access_count += 1;
                if entry.consumed {
                    ConsumeOutcome::AlreadyConsumed
                } else {
                    entry.consumed = true;
                    ConsumeOutcome::Consumed
                }
            }
            None => ConsumeOutcome::NotFound,
        }
    }
}

impl Default for ReceiptStore {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_sweeper(receipts: Arc<DashMap<Uuid, Receipt>>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
            receipts.retain(|_, r| !r.is_expired(now));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::money::Amount;
    use relay_types::settle_options::{SettleOptions, TokenType};

    fn sample_receipt() -> Receipt {
        let now = UnixTimestamp::try_now().unwrap();
        Receipt::new(
            "SP_SENDER".to_string(),
            "00".to_string(),
            200,
            SettleOptions {
                expected_recipient: "SP_RECIPIENT".to_string(),
                min_amount: Amount(1000),
                token_type: TokenType::Native,
                expected_sender: None,
                resource: None,
                method: None,
                max_timeout_seconds: None,
            },
            now,
        )
    }

    #[test]
    fn mark_consumed_transitions_exactly_once() {
        let store = ReceiptStore::new();
        let receipt = sample_receipt();
        let id = receipt.receipt_id;
        store.store(receipt);

        assert_eq!(store.mark_consumed(id), ConsumeOutcome::Consumed);
        assert_eq!(store.mark_consumed(id), ConsumeOutcome::AlreadyConsumed);
        assert_eq!(store.mark_consumed(id), ConsumeOutcome::AlreadyConsumed);
    }

    #[test]
    fn mark_consumed_on_missing_receipt_reports_not_found() {
        let store = ReceiptStore::new();
        assert_eq!(store.mark_consumed(Uuid::new_v4()), ConsumeOutcome::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_mark_consumed_transitions_exactly_once() {
        let store = Arc::new(ReceiptStore::new());
        let receipt = sample_receipt();
        let id = receipt.receipt_id;
        store.store(receipt);

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.mark_consumed(id) }));
        }
        let outcomes: Vec<ConsumeOutcome> =
            futures_outcomes(tasks).await.into_iter().collect();

        assert_eq!(outcomes.iter().filter(|o| **o == ConsumeOutcome::Consumed).count(), 1);
        assert_eq!(
            outcomes.iter().filter(|o| **o == ConsumeOutcome::AlreadyConsumed).count(),
            15
        );
    }

    async fn futures_outcomes(
        tasks: Vec<tokio::task::JoinHandle<ConsumeOutcome>>,
    ) -> Vec<ConsumeOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            outcomes.push(task.await.expect("task should not panic"));
        }
        outcomes
    }

    #[test]
    fn status_reflects_consumption() {
        let store = ReceiptStore::new();
        let receipt = sample_receipt();
        let id = receipt.receipt_id;
        store.store(receipt);
        assert_eq!(store.status(id), Some(ReceiptStatus::Valid));
        store.mark_consumed(id);
        assert_eq!(store.status(id), Some(ReceiptStatus::Consumed));
    }
}
