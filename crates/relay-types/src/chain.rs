//! The chain-client contract: broadcast, status polling, nonce lookup and
//! fee estimates, abstracted over the underlying indexer.
//!
//! Grounded on the teacher's `ChainProviderOps`/`FromConfig` traits
//! ([`x402_types::chain`]): a small async trait that chain-specific crates
//! implement, with the concrete Stacks implementation living in
//! `relay-chain-stacks`.

use crate::fee::FeeEstimates;
use async_trait::async_trait;
use std::time::Duration;

/// Default per-request timeout applied by every [`ChainClient`] call.
///
/// Spec §4.1: "All calls carry a 5-10s per-request timeout."
pub const CHAIN_CLIENT_TIMEOUT: Duration = Duration::from_secs(8);

/// Outcome of submitting a transaction to the mempool.
#[derive(Debug, Clone)]
pub enum BroadcastOutcome {
    /// The indexer accepted the transaction into its mempool.
    Accepted { txid: String },
    /// The indexer rejected the transaction with a free-text reason.
    ///
    /// The reason is classified by [`classify_rejection`] into a nonce
    /// conflict or a generic broadcast failure; the relay never tries to
    /// parse further structure out of it.
    Rejected { reason: String },
}

/// Classification of a broadcast rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionClass {
    /// The sender's nonce already has a conflicting transaction in flight.
    NonceConflict,
    /// Any other rejection reason.
    Generic,
}

/// A small, closed set of substrings that identify a nonce-conflict
/// rejection. See spec §4.1.
const NONCE_CONFLICT_MARKERS: &[&str] = &["ConflictingNonceInMempool", "BadNonce"];

/// Classifies a broadcast rejection reason string.
pub fn classify_rejection(reason: &str) -> RejectionClass {
    if NONCE_CONFLICT_MARKERS.iter().any(|marker| reason.contains(marker)) {
        RejectionClass::NonceConflict
    } else {
        RejectionClass::Generic
    }
}

/// On-chain status of a previously broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Not yet included in a block (also returned for a 404 from the indexer:
    /// spec §4.1 treats "not yet indexed" the same as "pending").
    Pending,
    /// Included in a block and successful.
    Success,
    /// Included in a block but aborted (`abort_by_response`, `abort_by_post_condition`, ...).
    Abort,
    /// Dropped from the mempool (`dropped_replace_by_fee`, `dropped_too_expensive`, ...).
    Dropped,
}

impl TxStatus {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, TxStatus::Abort | TxStatus::Dropped)
    }
}

/// Result of a `getTxStatus` poll.
#[derive(Debug, Clone, Copy)]
pub struct TxStatusResult {
    pub status: TxStatus,
    pub block_height: Option<u64>,
}

/// Errors a [`ChainClient`] call can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("chain client request timed out")]
    Timeout,
    #[error("chain client transport error: {0}")]
    Transport(String),
    #[error("chain client returned an unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// The indexer contract the rest of the relay depends on.
///
/// Implementations are expected to apply their own retry/timeout policy
/// internally (spec §4.1: 5-10s per request, failure-tolerant).
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submits a fully-signed transaction to the mempool.
    async fn broadcast(&self, tx_bytes: &[u8]) -> Result<BroadcastOutcome, ChainClientError>;

    /// Fetches the current status of a previously broadcast transaction.
    ///
    /// A 404 from the underlying indexer is mapped to [`TxStatus::Pending`]
    /// by the implementation, not surfaced as an error.
    async fn get_tx_status(&self, txid: &str) -> Result<TxStatusResult, ChainClientError>;

    /// Returns the indexer's view of the next unused nonce for `address`.
    async fn get_possible_next_nonce(&self, address: &str) -> Result<u64, ChainClientError>;

    /// Fetches raw (unclamped) fee estimates for each transaction-payload class.
    async fn get_fee_estimates(&self) -> Result<FeeEstimates, ChainClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_nonce_conflict_markers() {
        assert_eq!(
            classify_rejection("ConflictingNonceInMempool: nonce 4 already used"),
            RejectionClass::NonceConflict
        );
        assert_eq!(classify_rejection("BadNonce(4, 6)"), RejectionClass::NonceConflict);
    }

    #[test]
    fn classifies_unknown_reasons_as_generic() {
        assert_eq!(classify_rejection("FeeTooLow"), RejectionClass::Generic);
        assert_eq!(classify_rejection(""), RejectionClass::Generic);
    }

    #[test]
    fn terminal_failure_covers_abort_and_dropped_only() {
        assert!(TxStatus::Abort.is_terminal_failure());
        assert!(TxStatus::Dropped.is_terminal_failure());
        assert!(!TxStatus::Pending.is_terminal_failure());
        assert!(!TxStatus::Success.is_terminal_failure());
    }
}
