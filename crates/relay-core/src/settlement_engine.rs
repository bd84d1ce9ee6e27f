//! Payment-parameter verification and broadcast-then-confirm polling.
//! Spec §4.6.
//!
//! Grounded on the teacher's verification/settlement split
//! (`x402_core::facilitator_local`'s `verify`/`settle` pair): parameter
//! checks are pure and synchronous, broadcast-and-confirm is the only part
//! that talks to the chain.

use relay_types::chain::{
    classify_rejection, BroadcastOutcome, ChainClient, ChainClientError, RejectionClass, TxStatus,
};
use relay_types::known_tokens;
use relay_types::money::Amount;
use relay_types::settle_options::{SettleOptions, TokenType};
use std::time::Duration;
use tracing::{info, warn};

/// A transaction's payment-relevant fields, as decoded from the raw
/// transaction bytes by the caller. Full Clarity transaction decoding has
/// no grounding anywhere in the pack, so that decode step is assumed to
/// have already happened upstream; this module only checks the decoded
/// fields against the declared settle options.
#[derive(Debug, Clone)]
pub struct ParsedPayment {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
    /// `Some(contract_id)` for a SIP-010 `transfer` call, `None` for a plain
    /// STX token-transfer.
    pub contract_id: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("recipient does not match expectedRecipient")]
    RecipientMismatch,
    #[error("sender does not match expectedSender")]
    SenderMismatch,
    #[error("amount is below minAmount")]
    InsufficientAmount,
    #[error("transaction moves a token but settle options declare tokenType native")]
    UnexpectedContractCall,
    #[error("transaction is a plain transfer but settle options declare a non-native tokenType")]
    MissingContractCall,
    #[error("contract is not on the known-token allow-list")]
    UnknownTokenContract,
    #[error("contract's token type does not match declared tokenType")]
    TokenTypeMismatch,
}

/// Checks a decoded payment against the settle options it's claimed to
/// satisfy. Spec §4.6 "verifyPaymentParams": native vs. contract-call/SIP-010
/// dispatch against the known-token allow-list.
pub fn verify_payment_params(
    payment: &ParsedPayment,
    options: &SettleOptions,
) -> Result<(), VerifyError> {
    if !options.recipient_matches(&payment.recipient) {
        return Err(VerifyError::RecipientMismatch);
    }
    if let Some(expected_sender) = &options.expected_sender {
        if !expected_sender.eq_ignore_ascii_case(&payment.sender) {
            return Err(VerifyError::SenderMismatch);
        }
    }
    if payment.amount < options.min_amount {
        return Err(VerifyError::InsufficientAmount);
    }

    match (options.token_type, &payment.contract_id) {
        (TokenType::Native, None) => Ok(()),
        (TokenType::Native, Some(_)) => Err(VerifyError::UnexpectedContractCall),
        (_, None) => Err(VerifyError::MissingContractCall),
        (declared, Some(contract_id)) => {
            let actual = known_tokens::token_type_by_contract(contract_id)
                .ok_or(VerifyError::UnknownTokenContract)?;
            if actual != declared {
                return Err(VerifyError::TokenTypeMismatch);
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Success { txid: String, block_height: Option<u64> },
    Abort { txid: String },
    Dropped { txid: String },
    /// Neither confirmed nor rejected within the poll budget; still pending
    /// on-chain. Spec §4.6: the receipt keeps `txid` and the caller can poll
    /// `/verify/:receiptId` later.
    TimedOut { txid: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("broadcast rejected: nonce conflict")]
    NonceConflict { reason: String },
    #[error("broadcast rejected: {reason}")]
    Rejected { reason: String },
    #[error("chain client error: {0}")]
    Chain(#[from] ChainClientError),
}

/// Initial poll interval. Spec §4.6 "exponential backoff confirmation polling".
const POLL_INITIAL: Duration = Duration::from_secs(2);
/// Backoff multiplier applied after every poll.
const POLL_FACTOR: f64 = 1.5;
/// Per-poll interval ceiling.
const POLL_CAP: Duration = Duration::from_secs(8);

/// Broadcasts `tx_bytes` and polls for confirmation with exponential
/// backoff (initial 2s, factor 1.5, capped at 8s per poll) until
/// `max_poll_duration` elapses or the transaction reaches a terminal state.
pub async fn broadcast_and_confirm(
    chain: &dyn ChainClient,
    tx_bytes: &[u8],
    max_poll_duration: Duration,
) -> Result<ConfirmOutcome, BroadcastError> {
    let txid = match chain.broadcast(tx_bytes).await? {
        BroadcastOutcome::Accepted { txid } => txid,
        BroadcastOutcome::Rejected { reason } => {
            return Err(match classify_rejection(&reason) {
                RejectionClass::NonceConflict => BroadcastError::NonceConflict { reason },
                RejectionClass::Generic => BroadcastError::Rejected { reason },
            });
        }
    };

    info!(%txid, "broadcast accepted, polling for confirmation");
    let deadline = tokio::time::Instant::now() + max_poll_duration;
    let mut interval = POLL_INITIAL;

    loop {
        if tokio::time::Instant::now() >= deadline {
            return Ok(ConfirmOutcome::TimedOut { txid });
        }
        let sleep_for = interval.min(deadline.saturating_duration_since(tokio::time::Instant::now()));
        tokio::time::sleep(sleep_for).await;

        match chain.get_tx_status(&txid).await {
            Ok(result) => match result.status {
                TxStatus::Success => {
                    return Ok(ConfirmOutcome::Success { txid, block_height: result.block_height })
                }
                TxStatus::Abort => return Ok(ConfirmOutcome::Abort { txid }),
                TxStatus::Dropped => return Ok(ConfirmOutcome::Dropped { txid }),
                TxStatus::Pending => {}
            },
            Err(err) => warn!(%txid, ?err, "poll failed, retrying"),
        }

        let next_secs = (interval.as_secs_f64() * POLL_FACTOR).min(POLL_CAP.as_secs_f64());
        interval = Duration::from_secs_f64(next_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(token_type: TokenType, expected_sender: Option<&str>) -> SettleOptions {
        SettleOptions {
            expected_recipient: "SP_RECIPIENT".to_string(),
            min_amount: Amount(1000),
            token_type,
            expected_sender: expected_sender.map(str::to_string),
            resource: None,
            method: None,
            max_timeout_seconds: None,
        }
    }

    fn payment(recipient: &str, amount: u128, contract_id: Option<&str>) -> ParsedPayment {
        ParsedPayment {
            sender: "SP_SENDER".to_string(),
            recipient: recipient.to_string(),
            amount: Amount(amount),
            contract_id: contract_id.map(str::to_string),
        }
    }

    #[test]
    fn native_transfer_matching_options_is_accepted() {
        let options = options(TokenType::Native, None);
        let payment = payment("sp_recipient", 1000, None);
        assert!(verify_payment_params(&payment, &options).is_ok());
    }

    #[test]
    fn amount_below_minimum_is_rejected() {
        let options = options(TokenType::Native, None);
        let payment = payment("SP_RECIPIENT", 999, None);
        assert_eq!(verify_payment_params(&payment, &options), Err(VerifyError::InsufficientAmount));
    }

    #[test]
    fn recipient_mismatch_is_rejected() {
        let options = options(TokenType::Native, None);
        let payment = payment("SP_OTHER", 1000, None);
        assert_eq!(verify_payment_params(&payment, &options), Err(VerifyError::RecipientMismatch));
    }

    #[test]
    fn sender_mismatch_is_rejected_when_declared() {
        let options = options(TokenType::Native, Some("SP_EXPECTED"));
        let payment = payment("SP_RECIPIENT", 1000, None);
        assert_eq!(verify_payment_params(&payment, &options), Err(VerifyError::SenderMismatch));
    }

    #[test]
    fn contract_call_against_native_options_is_rejected() {
        let options = options(TokenType::Native, None);
        let payment = payment("SP_RECIPIENT", 1000, Some("SP_X.token-foo"));
        assert_eq!(verify_payment_params(&payment, &options), Err(VerifyError::UnexpectedContractCall));
    }

    #[test]
    fn plain_transfer_against_stablecoin_options_is_rejected() {
        let options = options(TokenType::Stablecoin, None);
        let payment = payment("SP_RECIPIENT", 1000, None);
        assert_eq!(verify_payment_params(&payment, &options), Err(VerifyError::MissingContractCall));
    }

    #[test]
    fn unknown_contract_is_rejected() {
        let options = options(TokenType::Stablecoin, None);
        let payment = payment("SP_RECIPIENT", 1000, Some("SP_UNKNOWN.token"));
        assert_eq!(verify_payment_params(&payment, &options), Err(VerifyError::UnknownTokenContract));
    }

    #[test]
    fn known_contract_with_mismatched_token_type_is_rejected() {
        let options = options(TokenType::Stablecoin, None);
        let payment = payment(
            "SP_RECIPIENT",
            1000,
            Some("SP3Y2ZSH8P7D50B0VBTSX11S7XSG24M1VB9YFQA4K.token-wbtc"),
        );
        assert_eq!(verify_payment_params(&payment, &options), Err(VerifyError::TokenTypeMismatch));
    }

    #[test]
    fn known_contract_with_matching_token_type_is_accepted() {
        let options = options(TokenType::BridgedBtc, None);
        let payment = payment(
            "SP_RECIPIENT",
            1000,
            Some("SP3Y2ZSH8P7D50B0VBTSX11S7XSG24M1VB9YFQA4K.token-wbtc"),
        );
        assert!(verify_payment_params(&payment, &options).is_ok());
    }
}
