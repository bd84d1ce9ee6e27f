//! Sponsor wallets and the full `/relay`/`/sponsor` request lifecycle.
//! Spec §4.7.
//!
//! Grounded on the teacher's scheme-handler dispatch
//! (`x402_core::facilitator_local::FacilitatorLocal::settle`): one method
//! that walks validate -> verify -> broadcast -> persist in order, bailing
//! out with a closed error code at the first failing step. Nonce handling,
//! dedup and receipts are new state this pipeline owns that the teacher's
//! single-shot settlement didn't need.

use crate::dedup_store::{DedupStore, PaymentIdLookup};
use crate::fee_service::FeeService;
use crate::nonce_coordinator::{NonceCoordinatorHandle, NonceError};
use crate::quota_tracker::{QuotaDenied, QuotaTracker};
use crate::rate_limiter::RateLimiter;
use crate::receipt_store::ReceiptStore;
use crate::settlement_engine::{self, BroadcastError, ConfirmOutcome, ParsedPayment, VerifyError};
use k256::ecdsa::SigningKey;
use relay_chain_stacks::StacksChainClient;
use relay_types::api_key::ApiKeyMetadata;
use relay_types::chain::TxStatus;
use relay_types::dedup::DedupEntry;
use relay_types::fee::TxType;
use relay_types::nonce::AssignedNonce;
use relay_types::proto::error::RelayErrorCode;
use relay_types::proto::relay::{RelayRequest, RelayResponse, SettlementSnapshot};
use relay_types::receipt::Receipt;
use relay_types::settle_options::SettleOptions;
use relay_types::timestamp::UnixTimestamp;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A single sponsor wallet: the address the coordinator tracks nonces for,
/// and the key that attaches the sponsor half of the fee.
///
/// There is no Stacks transaction-encoding crate anywhere in the pack, so
/// `sponsor()` does not rebuild a real multi-spending-condition Stacks
/// transaction; it appends a nonce/fee/signature suffix over a digest of the
/// sender-signed bytes. Swapping this for a real `stacks-transactions`-style
/// encoder is the one piece of this pipeline that would need to change to
/// produce a transaction a live Stacks node would accept.
pub struct SponsorWallet {
    pub address: String,
    signing_key: SigningKey,
}

#[derive(Debug, thiserror::Error)]
pub enum SponsorError {
    #[error("transaction hex is malformed")]
    InvalidTransaction,
    #[error("sponsor signing failed")]
    SigningFailed,
}

impl SponsorWallet {
    pub fn new(address: String, signing_key: SigningKey) -> Self {
        SponsorWallet { address, signing_key }
    }

    fn sponsor(&self, tx_hex: &str, nonce: u64, fee: u64) -> Result<String, SponsorError> {
        let mut bytes = hex::decode(tx_hex.trim_start_matches("0x"))
            .map_err(|_| SponsorError::InvalidTransaction)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hasher.update(nonce.to_be_bytes());
        hasher.update(fee.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|_| SponsorError::SigningFailed)?;

        bytes.extend_from_slice(&nonce.to_be_bytes());
        bytes.extend_from_slice(&fee.to_be_bytes());
        bytes.extend_from_slice(&signature.to_bytes());
        bytes.push(recovery_id.to_byte());
        Ok(hex::encode(bytes))
    }
}

/// How the pipeline decodes `transaction` into its payment-relevant fields.
/// No Clarity transaction parser exists in the pack; callers supply the
/// decode. See [`ParsedPayment`] for the same simplification.
pub trait TxDecoder: Send + Sync {
    fn decode(&self, tx_hex: &str) -> Result<ParsedPayment, ()>;
}

/// A structured, closed failure a pipeline step can bail out with.
#[derive(Debug, Clone)]
pub struct RelayFailure {
    pub code: RelayErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl RelayFailure {
    pub(crate) fn new(code: RelayErrorCode, message: &str) -> Self {
        RelayFailure { code, message: message.to_string(), details: None }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

struct BroadcastResult {
    txid: String,
    block_height: Option<u64>,
    status: TxStatus,
    fee: u64,
    sponsored_tx: String,
}

pub struct SponsorPipeline<D> {
    chain: Arc<StacksChainClient>,
    wallets: Vec<SponsorWallet>,
    coordinators: Vec<NonceCoordinatorHandle>,
    fee_service: Arc<FeeService>,
    dedup_store: Arc<DedupStore>,
    receipt_store: Arc<ReceiptStore>,
    rate_limiter: Arc<RateLimiter>,
    quota: Arc<QuotaTracker>,
    decoder: D,
    next_wallet: AtomicUsize,
}

impl<D: TxDecoder> SponsorPipeline<D> {
    pub fn new(
        chain: Arc<StacksChainClient>,
        wallets: Vec<SponsorWallet>,
        fee_service: Arc<FeeService>,
        dedup_store: Arc<DedupStore>,
        receipt_store: Arc<ReceiptStore>,
        rate_limiter: Arc<RateLimiter>,
        quota: Arc<QuotaTracker>,
        decoder: D,
    ) -> Self {
        let coordinators = wallets
            .iter()
            .enumerate()
            .map(|(index, wallet)| {
                NonceCoordinatorHandle::spawn(index as u32, wallet.address.clone(), chain.clone())
            })
            .collect();
        SponsorPipeline {
            chain,
            wallets,
            coordinators,
            fee_service,
            dedup_store,
            receipt_store,
            rate_limiter,
            quota,
            decoder,
            next_wallet: AtomicUsize::new(0),
        }
    }

    fn pick_wallet(&self) -> usize {
        self.next_wallet.fetch_add(1, Ordering::Relaxed) % self.wallets.len()
    }

    /// Full `/relay` lifecycle: steps 1-13 of spec §4.7. `api_key` is
    /// `Some` only when the caller presented a bearer token -- `/relay`
    /// does not mandate one, so quota enforcement is conditional.
    #[instrument(skip(self, req))]
    pub async fn relay(
        &self,
        req: RelayRequest,
        agent_key: &str,
        api_key: Option<&ApiKeyMetadata>,
    ) -> Result<RelayResponse, RelayFailure> {
        let request_id = Uuid::new_v4();

        // Step 1: parse & validate.
        if req.transaction.trim().is_empty() {
            return Err(RelayFailure::new(RelayErrorCode::MissingTransaction, "transaction is required"));
        }
        let options = SettleOptions::validate(req.settle)
            .map_err(|err| RelayFailure::new(RelayErrorCode::InvalidSettleOptions, &err.to_string()))?;

        self.rate_limiter_check(agent_key)?;
        self.quota_check(api_key)?;
        if let Some(cached) = self.dedup_store.check_dedup(&req.transaction) {
            return Ok(self.response_from_dedup(request_id, cached));
        }

        let payment = self.decode(&req.transaction)?;
        let max_poll = options.max_poll_duration();

        let broadcast = self
            .sign_broadcast_and_confirm(request_id, &req.transaction, &payment, Some(&options), max_poll, api_key)
            .await?;

        // Step 11: store receipt (best-effort), bound to this request's settle options.
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        let mut receipt =
            Receipt::new(payment.sender.clone(), broadcast.sponsored_tx.clone(), broadcast.fee, options, now);
        receipt.txid = Some(broadcast.txid.clone());
        let receipt_id = receipt.receipt_id;
        self.receipt_store.store(receipt);

        self.record_dedup_and_respond(request_id, req.transaction, payment, broadcast, Some(receipt_id))
    }

    /// `/sponsor` lifecycle: identical to `/relay` minus payment verification
    /// (step 7) and receipt issuance (step 11). Spec §4.7. `/sponsor`
    /// requires a bearer API key, so `api_key` is always `Some` here in
    /// practice; the handler enforces that before calling in.
    #[instrument(skip(self, req))]
    pub async fn sponsor_only(
        &self,
        req: relay_types::proto::relay::SponsorRequest,
        agent_key: &str,
        api_key: Option<&ApiKeyMetadata>,
    ) -> Result<RelayResponse, RelayFailure> {
        let request_id = Uuid::new_v4();

        if req.transaction.trim().is_empty() {
            return Err(RelayFailure::new(RelayErrorCode::MissingTransaction, "transaction is required"));
        }
        self.rate_limiter_check(agent_key)?;
        self.quota_check(api_key)?;
        if let Some(cached) = self.dedup_store.check_dedup(&req.transaction) {
            return Ok(self.response_from_dedup(request_id, cached));
        }

        let payment = self.decode(&req.transaction)?;
        let max_poll = std::time::Duration::from_secs(55);
        let broadcast = self
            .sign_broadcast_and_confirm(request_id, &req.transaction, &payment, None, max_poll, api_key)
            .await?;

        self.record_dedup_and_respond(request_id, req.transaction, payment, broadcast, None)
    }

    fn rate_limiter_check(&self, agent_key: &str) -> Result<(), RelayFailure> {
        self.rate_limiter.check(agent_key).map_err(|denied| {
            RelayFailure::new(RelayErrorCode::RateLimitExceeded, "rate limit exceeded")
                .with_details(format!("retryAfter={}", denied.retry_after))
        })
    }

    /// Per-API-key daily request/fee-cap quota (spec §2 "rate/quota check").
    /// A no-op when the caller presented no API key, since `/relay` doesn't
    /// mandate one.
    fn quota_check(&self, api_key: Option<&ApiKeyMetadata>) -> Result<(), RelayFailure> {
        let Some(key) = api_key else {
            return Ok(());
        };
        self.quota.check(&key.key_id, key.tier.limits()).map_err(|denied| match denied {
            QuotaDenied::DailyRequestsExceeded => {
                RelayFailure::new(RelayErrorCode::DailyLimitExceeded, "daily request limit exceeded")
            }
            QuotaDenied::DailyFeeCapExceeded => {
                RelayFailure::new(RelayErrorCode::SpendingCapExceeded, "daily fee cap exceeded")
            }
        })
    }

    fn decode(&self, tx_hex: &str) -> Result<ParsedPayment, RelayFailure> {
        self.decoder
            .decode(tx_hex)
            .map_err(|_| RelayFailure::new(RelayErrorCode::InvalidTransaction, "transaction could not be decoded"))
    }

    /// Steps 4-10 of spec §4.7: fee clamp, nonce assign, sponsor-sign,
    /// optional payment-parameter verification, broadcast and poll, then
    /// consume-or-release the nonce on every terminal path exactly once.
    async fn sign_broadcast_and_confirm(
        &self,
        request_id: Uuid,
        tx_hex: &str,
        payment: &ParsedPayment,
        verify_against: Option<&SettleOptions>,
        max_poll: std::time::Duration,
        api_key: Option<&ApiKeyMetadata>,
    ) -> Result<BroadcastResult, RelayFailure> {
        let tx_type = if payment.contract_id.is_some() { TxType::ContractCall } else { TxType::TokenTransfer };
        let (estimates, _source) = self.fee_service.get_estimates().await;
        let fee = estimates.tier_for(tx_type).medium;

        let wallet_index = self.pick_wallet();
        let coordinator = &self.coordinators[wallet_index];
        let AssignedNonce { nonce, .. } = coordinator.assign(request_id).await.map_err(|err| match err {
            NonceError::NonceDoUnavailable => {
                RelayFailure::new(RelayErrorCode::NonceDoUnavailable, "no nonce available")
            }
            NonceError::ActorGone => RelayFailure::new(RelayErrorCode::InternalError, "nonce coordinator unavailable"),
        })?;

        let sponsored_tx = match self.wallets[wallet_index].sponsor(tx_hex, nonce, fee) {
            Ok(tx) => tx,
            Err(err) => {
                coordinator.release(nonce).await;
                return Err(RelayFailure::new(RelayErrorCode::SponsorFailed, &err.to_string()));
            }
        };

        if let Some(options) = verify_against {
            if let Err(err) = settlement_engine::verify_payment_params(payment, options) {
                coordinator.release(nonce).await;
                return Err(relay_failure_from_verify(err));
            }
        }

        let tx_bytes = hex::decode(sponsored_tx.trim_start_matches("0x"))
            .map_err(|_| RelayFailure::new(RelayErrorCode::InvalidTransaction, "sponsored transaction is malformed"))?;

        let outcome = match settlement_engine::broadcast_and_confirm(self.chain.as_ref(), &tx_bytes, max_poll).await {
            Ok(outcome) => outcome,
            Err(BroadcastError::NonceConflict { reason }) => {
                coordinator.release(nonce).await;
                coordinator.record_conflict().await;
                coordinator.resync_delayed();
                warn!(%reason, "broadcast rejected: nonce conflict");
                return Err(RelayFailure::new(RelayErrorCode::NonceConflict, "nonce conflict").with_details(reason));
            }
            Err(BroadcastError::Rejected { reason }) => {
                coordinator.release(nonce).await;
                return Err(RelayFailure::new(RelayErrorCode::SettlementBroadcastFailed, "broadcast failed")
                    .with_details(reason));
            }
            Err(BroadcastError::Chain(err)) => {
                coordinator.release(nonce).await;
                return Err(RelayFailure::new(RelayErrorCode::BroadcastFailed, &err.to_string()));
            }
        };

        match &outcome {
            ConfirmOutcome::Abort { .. } | ConfirmOutcome::Dropped { .. } => {
                coordinator.release(nonce).await;
                return Err(RelayFailure::new(RelayErrorCode::SettlementFailed, "transaction failed on-chain"));
            }
            ConfirmOutcome::Success { .. } | ConfirmOutcome::TimedOut { .. } => {
                coordinator.consume(nonce, fee).await;
            }
        }

        let (txid, block_height, status) = match outcome {
            ConfirmOutcome::Success { txid, block_height } => (txid, block_height, TxStatus::Success),
            ConfirmOutcome::TimedOut { txid } => (txid, None, TxStatus::Pending),
            _ => unreachable!("abort/dropped handled above"),
        };

        // Step 10: record usage + fee against the caller's API key, on
        // broadcast success only.
        if let Some(key) = api_key {
            self.quota.record_usage(&key.key_id, fee);
        }

        info!(%txid, wallet_index, "sponsor pipeline broadcast settled");
        Ok(BroadcastResult { txid, block_height, status, fee, sponsored_tx })
    }

    fn record_dedup_and_respond(
        &self,
        request_id: Uuid,
        tx_hex: String,
        payment: ParsedPayment,
        broadcast: BroadcastResult,
        receipt_id: Option<Uuid>,
    ) -> Result<RelayResponse, RelayFailure> {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        self.dedup_store.record_dedup(
            &tx_hex,
            DedupEntry {
                txid: Some(broadcast.txid.clone()),
                receipt_id,
                status: broadcast.status,
                sender: payment.sender.clone(),
                recipient: payment.recipient.clone(),
                amount: payment.amount,
                block_height: broadcast.block_height,
                sponsored_tx: Some(broadcast.sponsored_tx.clone()),
                recorded_at: now,
            },
        );

        Ok(RelayResponse {
            success: true,
            request_id,
            explorer_url: Some(self.chain.network().explorer_url(&broadcast.txid)),
            txid: Some(broadcast.txid),
            settlement: Some(SettlementSnapshot {
                status: status_label(broadcast.status),
                sender: payment.sender,
                recipient: payment.recipient,
                amount: payment.amount,
                block_height: broadcast.block_height,
            }),
            sponsored_tx: Some(broadcast.sponsored_tx),
            receipt_id,
        })
    }

    fn response_from_dedup(&self, request_id: Uuid, entry: DedupEntry) -> RelayResponse {
        RelayResponse {
            success: true,
            request_id,
            explorer_url: entry.txid.as_deref().map(|txid| self.chain.network().explorer_url(txid)),
            txid: entry.txid.clone(),
            settlement: Some(SettlementSnapshot {
                status: status_label(entry.status),
                sender: entry.sender,
                recipient: entry.recipient,
                amount: entry.amount,
                block_height: entry.block_height,
            }),
            sponsored_tx: entry.sponsored_tx,
            receipt_id: entry.receipt_id,
        }
    }

    /// Looks up (or records) a caller-supplied payment-identifier result,
    /// for the idempotency guarantee described in spec §4.7.
    pub fn check_payment_id(&self, id: &str, payload_hash: &str) -> PaymentIdLookup {
        self.dedup_store.check_payment_id(id, payload_hash)
    }

    pub fn record_payment_id(&self, id: &str, payload_hash: String, response: serde_json::Value) {
        self.dedup_store.record_payment_id(id, payload_hash, response)
    }
}

/// Settlement-snapshot status vocabulary (spec §4.6/§4.7, scenario S1/S6):
/// `"confirmed"`/`"pending"`/`"abort"`/`"dropped"`, not the chain-level
/// `TxStatus` names -- a confirmed broadcast is `"confirmed"`, never `"success"`.
fn status_label(status: TxStatus) -> String {
    match status {
        TxStatus::Pending => "pending",
        TxStatus::Success => "confirmed",
        TxStatus::Abort => "abort",
        TxStatus::Dropped => "dropped",
    }
    .to_string()
}

fn relay_failure_from_verify(err: VerifyError) -> RelayFailure {
    RelayFailure::new(RelayErrorCode::SettlementVerificationFailed, &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_wallet_round_robins() {
        // Exercises the modular counter in isolation; a real pipeline needs a
        // live chain client to construct, which is covered by the handler
        // integration path instead.
        let next = AtomicUsize::new(0);
        let wallets = 3usize;
        let picks: Vec<usize> = (0..7).map(|_| next.fetch_add(1, Ordering::Relaxed) % wallets).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn status_label_matches_spec_vocabulary() {
        assert_eq!(status_label(TxStatus::Success), "confirmed");
        assert_eq!(status_label(TxStatus::Pending), "pending");
        assert_eq!(status_label(TxStatus::Abort), "abort");
    }
}
