//! [`ChainClient`] implementation backed by a Hiro-compatible Stacks indexer.
//!
//! Grounded on the teacher's RPC-provider pattern of wrapping a bare HTTP
//! client behind the crate's own trait (see `x402_types::chain::ChainProviderOps`)
//! and on the wider pack's `reqwest`-based API clients (e.g.
//! `danipolo-liquidator-rust`'s `LiqdClient`) for the request/response idiom,
//! since the teacher itself talks to EVM nodes over `alloy-provider`, which
//! has no Stacks equivalent.

use crate::config::{StacksChainConfig, StacksNetwork};
use relay_types::chain::{
    BroadcastOutcome, ChainClient, ChainClientError, TxStatus, TxStatusResult,
};
use relay_types::fee::{FeeEstimates, FeeTier, TxType};
use serde::Deserialize;
use tracing::{instrument, warn};

#[derive(Debug, Clone)]
pub struct StacksChainClient {
    http: reqwest::Client,
    config: StacksChainConfig,
}

impl StacksChainClient {
    pub fn new(config: StacksChainConfig) -> Result<Self, ChainClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainClientError::Transport(e.to_string()))?;
        Ok(StacksChainClient { http, config })
    }

    /// The Stacks network this client is configured against, for building
    /// per-network explorer links. Spec §6 `explorerUrl`.
    pub fn network(&self) -> StacksNetwork {
        self.config.network
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.network.api_base_url(), path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.hiro_api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BroadcastErrorBody {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TxStatusBody {
    tx_status: String,
    #[serde(default)]
    block_height: Option<u64>,
}

fn parse_tx_status(raw: &str) -> TxStatus {
    match raw {
        "success" => TxStatus::Success,
        s if s.starts_with("abort_") => TxStatus::Abort,
        s if s.starts_with("dropped_") => TxStatus::Dropped,
        _ => TxStatus::Pending,
    }
}

#[derive(Debug, Deserialize)]
struct AccountInfoBody {
    nonce: u64,
}

#[derive(Debug, Deserialize)]
struct FeeEstimationEntry {
    fee: u64,
}

#[derive(Debug, Deserialize)]
struct FeeEstimationBody {
    estimations: Vec<FeeEstimationEntry>,
}

#[async_trait::async_trait]
impl ChainClient for StacksChainClient {
    #[instrument(skip(self, tx_bytes))]
    async fn broadcast(&self, tx_bytes: &[u8]) -> Result<BroadcastOutcome, ChainClientError> {
        let response = self
            .authed(self.http.post(self.url("/v2/transactions")))
            .header("Content-Type", "application/octet-stream")
            .body(tx_bytes.to_vec())
            .send()
            .await
            .map_err(|e| ChainClientError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let txid = response
                .text()
                .await
                .map_err(|e| ChainClientError::Transport(e.to_string()))?
                .trim_matches('"')
                .to_string();
            return Ok(BroadcastOutcome::Accepted { txid });
        }

        let body: BroadcastErrorBody = response
            .json()
            .await
            .unwrap_or(BroadcastErrorBody { reason: None, error: None });
        let reason = body
            .reason
            .or(body.error)
            .unwrap_or_else(|| "broadcast rejected with no reason".to_string());
        Ok(BroadcastOutcome::Rejected { reason })
    }

    #[instrument(skip(self))]
    async fn get_tx_status(&self, txid: &str) -> Result<TxStatusResult, ChainClientError> {
        let response = self
            .authed(self.http.get(self.url(&format!("/extended/v1/tx/{txid}"))))
            .send()
            .await
            .map_err(|e| ChainClientError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(TxStatusResult { status: TxStatus::Pending, block_height: None });
        }
        if !response.status().is_success() {
            warn!(status = %response.status(), "tx status poll failed, treating as pending");
            return Ok(TxStatusResult { status: TxStatus::Pending, block_height: None });
        }

        let body: TxStatusBody = response
            .json()
            .await
            .map_err(|e| ChainClientError::UnexpectedResponse(e.to_string()))?;
        Ok(TxStatusResult {
            status: parse_tx_status(&body.tx_status),
            block_height: body.block_height,
        })
    }

    #[instrument(skip(self))]
    async fn get_possible_next_nonce(&self, address: &str) -> Result<u64, ChainClientError> {
        let response = self
            .authed(self.http.get(self.url(&format!("/v2/accounts/{address}?proof=0"))))
            .send()
            .await
            .map_err(|e| ChainClientError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChainClientError::UnexpectedResponse(format!(
                "account lookup failed with status {}",
                response.status()
            )));
        }
        let body: AccountInfoBody = response
            .json()
            .await
            .map_err(|e| ChainClientError::UnexpectedResponse(e.to_string()))?;
        Ok(body.nonce)
    }

    #[instrument(skip(self))]
    async fn get_fee_estimates(&self) -> Result<FeeEstimates, ChainClientError> {
        let tier_for = |tx_type: TxType| async move {
            let estimated_len = match tx_type {
                TxType::TokenTransfer => 180,
                TxType::ContractCall => 400,
                TxType::SmartContract => 1_200,
            };
            let response = self
                .authed(self.http.post(self.url("/v2/fees/transaction")))
                .json(&serde_json::json!({ "estimated_len": estimated_len }))
                .send()
                .await
                .map_err(|e| ChainClientError::Transport(e.to_string()))?;
            if !response.status().is_success() {
                return Err(ChainClientError::UnexpectedResponse(format!(
                    "fee estimation failed with status {}",
                    response.status()
                )));
            }
            let body: FeeEstimationBody = response
                .json()
                .await
                .map_err(|e| ChainClientError::UnexpectedResponse(e.to_string()))?;
            let fees: Vec<u64> = body.estimations.iter().map(|e| e.fee).collect();
            match fees.as_slice() {
                [low, medium, high, ..] => {
                    Ok(FeeTier { low: *low, medium: *medium, high: *high })
                }
                _ => Err(ChainClientError::UnexpectedResponse(
                    "fee estimation returned fewer than 3 tiers".to_string(),
                )),
            }
        };

        Ok(FeeEstimates {
            token_transfer: tier_for(TxType::TokenTransfer).await?,
            contract_call: tier_for(TxType::ContractCall).await?,
            smart_contract: tier_for(TxType::SmartContract).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_status_prefixes() {
        assert_eq!(parse_tx_status("success"), TxStatus::Success);
        assert_eq!(parse_tx_status("abort_by_response"), TxStatus::Abort);
        assert_eq!(parse_tx_status("abort_by_post_condition"), TxStatus::Abort);
        assert_eq!(parse_tx_status("dropped_replace_by_fee"), TxStatus::Dropped);
        assert_eq!(parse_tx_status("pending"), TxStatus::Pending);
        assert_eq!(parse_tx_status("anything_else"), TxStatus::Pending);
    }
}
