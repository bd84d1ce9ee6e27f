//! Closed error-code taxonomies for the two HTTP surfaces, spec §6/§7.
//!
//! Grounded on the teacher's `PaymentVerificationError` -> `ErrorReason` ->
//! `PaymentProblem` pipeline: a rich internal error type maps to a small,
//! closed wire enum via one exhaustive `match`, never a free-text string.

use serde::Serialize;

/// `code` values for the proprietary `/relay` and `/sponsor` surface.
///
/// Closed set, spec §6 "Error code taxonomy" -- used verbatim on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayErrorCode {
    MissingTransaction,
    MissingSettleOptions,
    InvalidSettleOptions,
    InvalidTransaction,
    NotSponsored,
    RateLimitExceeded,
    DailyLimitExceeded,
    SpendingCapExceeded,
    SponsorConfigError,
    SponsorFailed,
    NonceDoUnavailable,
    BroadcastFailed,
    SettlementVerificationFailed,
    SettlementBroadcastFailed,
    NonceConflict,
    SettlementFailed,
    ReceiptConsumed,
    NotFound,
    InvalidApiKey,
    ExpiredApiKey,
    InternalError,
}

impl RelayErrorCode {
    /// `(httpStatus, retryable, retryAfterSeconds)` per spec §4.7/§6/§7.
    pub fn http_mapping(&self) -> (u16, bool, Option<u64>) {
        use RelayErrorCode::*;
        match self {
            MissingTransaction => (400, false, None),
            MissingSettleOptions => (400, false, None),
            InvalidSettleOptions => (400, false, None),
            InvalidTransaction => (400, false, None),
            NotSponsored => (400, false, None),
            RateLimitExceeded => (429, true, Some(60)),
            DailyLimitExceeded => (429, false, None),
            SpendingCapExceeded => (429, false, None),
            SponsorConfigError => (500, false, None),
            SponsorFailed => (502, true, Some(5)),
            NonceDoUnavailable => (503, true, Some(3)),
            BroadcastFailed => (502, true, Some(5)),
            SettlementVerificationFailed => (400, false, None),
            SettlementBroadcastFailed => (502, true, Some(5)),
            NonceConflict => (409, true, Some(1)),
            SettlementFailed => (422, false, None),
            ReceiptConsumed => (409, false, None),
            NotFound => (404, false, None),
            InvalidApiKey => (401, false, None),
            ExpiredApiKey => (401, false, None),
            InternalError => (500, true, None),
        }
    }
}

/// `errorReason`/`invalidReason` values for the spec-compliant facilitator
/// surface (`/settle`, `/verify`). Spec §6 "Facilitator error codes".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilitatorErrorReason {
    InvalidPayload,
    InvalidPaymentRequirements,
    InvalidNetwork,
    InvalidScheme,
    UnsupportedScheme,
    UnrecognizedAsset,
    RecipientMismatch,
    AmountInsufficient,
    InvalidTransactionState,
    BroadcastFailed,
    TransactionFailed,
    ConflictingNonce,
    PaymentIdentifierConflict,
}

impl FacilitatorErrorReason {
    /// Facilitator endpoints collapse most failures into HTTP 200 with
    /// `errorReason` set; only malformed JSON and identifier conflicts use
    /// 4xx. Spec §7.
    pub fn http_status(&self) -> u16 {
        match self {
            FacilitatorErrorReason::InvalidPayload => 400,
            FacilitatorErrorReason::PaymentIdentifierConflict => 409,
            _ => 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_conflict_retries_after_one_second() {
        assert_eq!(RelayErrorCode::NonceConflict.http_mapping(), (409, true, Some(1)));
    }

    #[test]
    fn settlement_failed_is_not_retryable() {
        assert_eq!(RelayErrorCode::SettlementFailed.http_mapping(), (422, false, None));
    }

    #[test]
    fn facilitator_errors_mostly_collapse_to_200() {
        assert_eq!(FacilitatorErrorReason::AmountInsufficient.http_status(), 200);
        assert_eq!(FacilitatorErrorReason::InvalidPayload.http_status(), 400);
        assert_eq!(FacilitatorErrorReason::PaymentIdentifierConflict.http_status(), 409);
    }

    #[test]
    fn wire_casing_matches_spec_taxonomy() {
        let json = serde_json::to_string(&RelayErrorCode::NonceDoUnavailable).unwrap();
        assert_eq!(json, "\"NONCE_DO_UNAVAILABLE\"");
        let json = serde_json::to_string(&FacilitatorErrorReason::PaymentIdentifierConflict).unwrap();
        assert_eq!(json, "\"payment_identifier_conflict\"");
    }
}
