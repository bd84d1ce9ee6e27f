//! Wire types for the spec-compliant facilitator triplet: `/settle`,
//! `/verify`, `/supported`. Spec §6.
//!
//! Grounded on the teacher's `proto::v2::{SettleRequest, SettleResponse,
//! VerifyRequest, VerifyResponse, SupportedResponse}` shapes, trimmed to the
//! single `"exact"` scheme this relay implements.

use super::error::FacilitatorErrorReason;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayloadPayload {
    pub transaction: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub payload: PaymentPayloadPayload,
    #[serde(default)]
    pub accepted: Option<serde_json::Value>,
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub amount: String,
    pub asset: String,
    pub pay_to: String,
    #[serde(default)]
    pub max_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    #[serde(default)]
    pub x402_version: Option<u8>,
    pub payment_payload: PaymentPayload,
    pub payment_requirements: PaymentRequirements,
    #[serde(default)]
    pub payment_id: Option<String>,
}

pub type VerifyRequest = SettleRequest;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    pub transaction: String,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<FacilitatorErrorReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<FacilitatorErrorReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedPaymentKind {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponse {
    pub kinds: Vec<SupportedPaymentKind>,
    pub extensions: Vec<String>,
    pub signers: HashMap<String, Vec<String>>,
}

impl SupportedResponse {
    /// The relay's single static `/supported` advertisement: one scheme,
    /// one network, no extensions and no announced signers. Spec §6.
    pub fn exact_on(network: &str) -> Self {
        SupportedResponse {
            kinds: vec![SupportedPaymentKind {
                x402_version: 2,
                scheme: "exact".to_string(),
                network: network.to_string(),
            }],
            extensions: Vec::new(),
            signers: HashMap::from([(format!("{network}:*"), Vec::new())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_request_parses_camel_case_body() {
        let body = r#"{
            "paymentPayload": {"x402Version": 2, "payload": {"transaction": "00"}},
            "paymentRequirements": {
                "scheme": "exact", "network": "stacks:1",
                "amount": "1000", "asset": "native", "payTo": "SP_X"
            }
        }"#;
        let request: SettleRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.payment_requirements.scheme, "exact");
        assert!(request.payment_id.is_none());
    }

    #[test]
    fn supported_response_advertises_one_namespaced_signer_entry() {
        let response = SupportedResponse::exact_on("stacks:1");
        assert_eq!(response.kinds.len(), 1);
        assert!(response.signers.contains_key("stacks:1:*"));
    }
}
