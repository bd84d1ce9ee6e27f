//! Wire types for the proprietary `/relay`, `/sponsor`, `/fees`,
//! `/verify/:receiptId` and `/access` endpoints. Spec §6.

use crate::money::Amount;
use crate::settle_options::RawSettleOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SIP-018 structured-data authorization, attached optionally to `/relay`
/// and `/sponsor` requests. Spec §4.7 step 1 and §5 "cross-endpoint replay".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sip018Auth {
    /// The endpoint this signature is scoped to (`"relay"` or `"sponsor"`);
    /// must match the endpoint it's presented to.
    pub action: String,
    /// Unix-seconds expiry; the signature is rejected once past.
    pub expiry: u64,
    /// Per-signer replay-protection nonce, carried as a decimal string.
    pub nonce: String,
    /// Hex-encoded recoverable ECDSA signature over the structured-data hash.
    pub signature: String,
    /// Hex-encoded compressed public key of the signer, if recoverable.
    pub signer_public_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub transaction: String,
    pub settle: RawSettleOptions,
    #[serde(default)]
    pub auth: Option<Sip018Auth>,
    #[serde(default)]
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorRequest {
    pub transaction: String,
    #[serde(default)]
    pub auth: Option<Sip018Auth>,
}

/// Settlement detail embedded in a successful `/relay` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSnapshot {
    pub status: String,
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub success: bool,
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsored_tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<Uuid>,
}

/// Uniform error body for the proprietary surface. Spec §6.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayErrorResponse {
    pub success: bool,
    pub request_id: Uuid,
    pub error: String,
    pub code: crate::proto::error::RelayErrorCode,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeesResponse {
    pub estimates: crate::fee::FeeEstimates,
    pub source: FeeSource,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSource {
    Hiro,
    Cache,
    Default,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Valid,
    Consumed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReceiptResponse {
    pub status: ReceiptStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub receipt_id: Uuid,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub success: bool,
    pub request_id: Uuid,
    pub receipt_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_response_omits_absent_optionals() {
        let response = RelayResponse {
            success: true,
            request_id: Uuid::nil(),
            txid: Some("0xAA".to_string()),
            explorer_url: None,
            settlement: None,
            sponsored_tx: None,
            receipt_id: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"txid\":\"0xAA\""));
        assert!(!json.contains("explorerUrl"));
        assert!(!json.contains("receiptId"));
    }

    #[test]
    fn request_accepts_missing_optional_fields() {
        let body = r#"{"transaction":"00","settle":{"expectedRecipient":"SP_X","minAmount":"1"}}"#;
        let request: RelayRequest = serde_json::from_str(body).unwrap();
        assert!(request.auth.is_none());
        assert!(request.payment_id.is_none());
    }
}
