//! Nonce pool bookkeeping types shared between the nonce coordinator actor
//! and its callers.
//!
//! See spec §4.2 (Nonce Coordinator): one single-writer actor per sponsor
//! wallet, a fixed-size pool of reserved nonces, and gap-aware reconciliation
//! against the chain's view of "next possible nonce".

use crate::timestamp::UnixTimestamp;
use serde::Serialize;
use uuid::Uuid;

/// Number of nonces a wallet actor keeps pre-reserved ahead of the chain's
/// confirmed nonce. Spec §4.2: fixed pool size of 8 per wallet.
pub const POOL_SIZE: u64 = 8;

/// A nonce the coordinator has handed out to one in-flight request.
#[derive(Debug, Clone, Copy)]
pub struct ReservedNonce {
    pub nonce: u64,
    pub assigned_at: UnixTimestamp,
    pub request_id: Uuid,
}

/// A nonce assignment returned to a pipeline caller.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssignedNonce {
    pub nonce: u64,
    pub wallet_index: u32,
}

/// How a wallet's pool should be reconciled against chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Re-fetch the chain's possible-next-nonce and advance the low-water
    /// mark without discarding nonces already assigned to in-flight requests.
    Resync,
    /// Discard every reservation and rebuild the pool from scratch. Used
    /// after a confirmed nonce conflict or a prolonged reconcile failure.
    HardReset,
}

/// Per-wallet counters surfaced on the `/fees`/admin diagnostics surface.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoncePoolStats {
    pub total_assigned: u64,
    pub conflicts_detected: u64,
    pub gaps_recovered: u64,
    pub tx_count_today: u64,
    pub fees_spent: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_matches_spec() {
        assert_eq!(POOL_SIZE, 8);
    }

    #[test]
    fn stats_default_to_zero() {
        let stats = NoncePoolStats::default();
        assert_eq!(stats.total_assigned, 0);
        assert_eq!(stats.fees_spent, 0);
    }
}
