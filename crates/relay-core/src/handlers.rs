//! The axum HTTP surface: the proprietary `/relay`, `/sponsor`, `/fees`,
//! `/verify/{receiptId}`, `/access` endpoints and the spec-compliant
//! facilitator triplet `/settle`, `/verify`, `/supported`. Spec §6.
//!
//! Grounded on the teacher's `routes::<A>()` + generic `State<A>` handler
//! pattern (`x402-rs-x402-rs/src/handlers.rs`): one router built from a
//! shared, cheaply-cloneable state, each handler matching on its
//! domain-level `Result` and converting the error arm into the wire shape
//! itself rather than threading status codes through the pipeline.

use crate::access_proxy::{self, AccessError};
use crate::api_key_store::{ApiKeyError, ApiKeyStore};
use crate::dedup_store::{DedupStore, PaymentIdLookup};
use crate::fee_service::FeeService;
use crate::receipt_store::{self, ReceiptStore};
use crate::settlement_engine::{self, BroadcastError, ConfirmOutcome, VerifyError};
use crate::sip018::{self, Sip018Domain, Sip018Error};
use crate::sponsor_pipeline::{RelayFailure, SponsorPipeline, TxDecoder};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use relay_chain_stacks::StacksChainClient;
use relay_types::dedup::payment_identifier_valid;
use relay_types::money::Amount;
use relay_types::proto::error::{FacilitatorErrorReason, RelayErrorCode};
use relay_types::proto::facilitator::{
    SettleRequest, SettleResponse, SupportedResponse, VerifyRequest, VerifyResponse,
};
use relay_types::proto::relay::{
    AccessRequest, AccessResponse, FeesResponse, ReceiptStatus as WireReceiptStatus, RelayErrorResponse,
    RelayRequest, RelayResponse, Sip018Auth, SponsorRequest, VerifyReceiptResponse,
};
use relay_types::settle_options::{SettleOptions, TokenType};
use relay_types::timestamp::UnixTimestamp;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Binds every SIP-018 signature this deployment accepts to one domain.
/// `chain_id` mirrors the configured Stacks network so a testnet-signed
/// payload can never authorize a mainnet action or vice versa.
pub fn sip018_domain(chain_id: u32) -> Sip018Domain {
    Sip018Domain { name: "sponsor-relay", version: "1", chain_id }
}

/// Shared application state, threaded into every handler via axum's
/// `State` extractor. Cheap to clone: every field is an `Arc` or a
/// zero/small-cost value.
pub struct AppState<D> {
    pub pipeline: Arc<SponsorPipeline<D>>,
    pub chain: Arc<StacksChainClient>,
    pub fee_service: Arc<FeeService>,
    pub receipt_store: Arc<ReceiptStore>,
    pub dedup_store: Arc<DedupStore>,
    pub api_keys: Arc<ApiKeyStore>,
    pub http: reqwest::Client,
    pub decoder: D,
    /// CAIP-2-style `"<namespace>:<reference>"` label this relay advertises
    /// on `/supported` and requires `paymentRequirements.network` to match.
    pub network_label: String,
    pub sip018_domain: Sip018Domain,
}

impl<D: Clone> Clone for AppState<D> {
    fn clone(&self) -> Self {
        AppState {
            pipeline: self.pipeline.clone(),
            chain: self.chain.clone(),
            fee_service: self.fee_service.clone(),
            receipt_store: self.receipt_store.clone(),
            dedup_store: self.dedup_store.clone(),
            api_keys: self.api_keys.clone(),
            http: self.http.clone(),
            decoder: self.decoder.clone(),
            network_label: self.network_label.clone(),
            sip018_domain: self.sip018_domain,
        }
    }
}

pub fn routes<D>() -> Router<AppState<D>>
where
    D: TxDecoder + Clone + 'static,
{
    Router::new()
        .route("/relay", post(post_relay::<D>))
        .route("/sponsor", post(post_sponsor::<D>))
        .route("/settle", post(post_settle::<D>))
        .route("/verify", post(post_verify::<D>))
        .route("/supported", get(get_supported::<D>))
        .route("/fees", get(get_fees::<D>))
        .route("/verify/{receipt_id}", get(get_verify_receipt::<D>))
        .route("/access", post(post_access::<D>))
}

fn retry_after_header(retry_after: Option<u64>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(seconds) = retry_after {
        if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
            headers.insert(HeaderName::from_static("retry-after"), value);
        }
    }
    headers
}

fn relay_error_response(request_id: Uuid, failure: RelayFailure) -> Response {
    let (status, retryable, retry_after) = failure.code.http_mapping();
    let body = RelayErrorResponse {
        success: false,
        request_id,
        error: failure.message,
        code: failure.code,
        retryable,
        details: failure.details,
        retry_after,
    };
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, retry_after_header(retry_after), Json(body)).into_response()
}

fn api_key_error_response(request_id: Uuid, err: ApiKeyError) -> Response {
    let code = match err {
        ApiKeyError::Missing | ApiKeyError::Invalid => RelayErrorCode::InvalidApiKey,
        ApiKeyError::Expired => RelayErrorCode::ExpiredApiKey,
    };
    relay_error_response(request_id, RelayFailure::new(code, &err.to_string()))
}

/// Maps a SIP-018 verification failure onto the closed relay error taxonomy.
/// There's no dedicated "bad signature" code in the set spec §6 defines;
/// `INVALID_API_KEY` is the closest fit both endpoints already return as
/// HTTP 401 for "caller failed to authenticate", so auth-signature failures
/// reuse it rather than growing the wire taxonomy unilaterally.
fn sip018_error_response(request_id: Uuid, err: Sip018Error) -> Response {
    relay_error_response(request_id, RelayFailure::new(RelayErrorCode::InvalidApiKey, &err.to_string()))
}

fn bearer_header<'a>(headers: &'a HeaderMap) -> Option<&'a str> {
    headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()
}

/// Spec §3: a caller-supplied payment identifier is 16-128 chars of
/// `[A-Za-z0-9_-]`. There's no dedicated "malformed identifier" code in the
/// relay taxonomy, so this reuses `INVALID_TRANSACTION`, the closest "your
/// request body is malformed" fit, same as `sip018_error_response` above
/// reuses `INVALID_API_KEY` for signature failures.
fn validate_payment_id_relay(id: &Option<String>) -> Result<(), RelayFailure> {
    match id {
        Some(id) if !payment_identifier_valid(id) => {
            Err(RelayFailure::new(RelayErrorCode::InvalidTransaction, "payment_id is malformed"))
        }
        _ => Ok(()),
    }
}

/// Facilitator-surface counterpart of [`validate_payment_id_relay`]. Reuses
/// `invalid_payload`, the closest "malformed request" fit in the facilitator
/// taxonomy.
fn validate_payment_id_facilitator(id: &Option<String>) -> Result<(), FacilitatorErrorReason> {
    match id {
        Some(id) if !payment_identifier_valid(id) => Err(FacilitatorErrorReason::InvalidPayload),
        _ => Ok(()),
    }
}

fn verify_auth<D>(state: &AppState<D>, auth: &Option<Sip018Auth>, action: &str) -> Result<(), Sip018Error> {
    match auth {
        Some(auth) => {
            let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
            sip018::verify(&state.sip018_domain, auth, action, now).map(|_signer| ())
        }
        None => Ok(()),
    }
}

/// `POST /relay`: full validate -> rate-limit -> dedup -> sponsor -> verify
/// -> broadcast -> receipt pipeline. Spec §4.7, §6. No API key is mandatory
/// here (unlike `/sponsor`), but a bearer token, when presented, is still
/// authenticated and its quota enforced.
#[instrument(skip(state, headers, body))]
pub async fn post_relay<D: TxDecoder>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
    Json(body): Json<RelayRequest>,
) -> Response {
    let request_id = Uuid::new_v4();

    if let Err(err) = verify_auth(&state, &body.auth, "relay") {
        return sip018_error_response(request_id, err);
    }
    if let Err(failure) = validate_payment_id_relay(&body.payment_id) {
        return relay_error_response(request_id, failure);
    }

    let api_key = match bearer_header(&headers) {
        Some(token) => match state.api_keys.authenticate(Some(token)) {
            Ok(metadata) => Some(metadata),
            Err(err) => return api_key_error_response(request_id, err),
        },
        None => None,
    };

    let agent_key = agent_key_for(&state, &body.transaction, &body.auth);
    match state.pipeline.relay(body, &agent_key, api_key.as_ref()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(failure) => relay_error_response(request_id, failure),
    }
}

/// `POST /sponsor`: sponsor-and-broadcast only, requires a bearer API key.
/// Spec §4.7, §6.
#[instrument(skip(state, headers, body))]
pub async fn post_sponsor<D: TxDecoder>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
    Json(body): Json<SponsorRequest>,
) -> Response {
    let request_id = Uuid::new_v4();

    let api_key = match state.api_keys.authenticate(bearer_header(&headers)) {
        Ok(metadata) => metadata,
        Err(err) => return api_key_error_response(request_id, err),
    };
    if let Err(err) = verify_auth(&state, &body.auth, "sponsor") {
        return sip018_error_response(request_id, err);
    }

    let agent_key = agent_key_for(&state, &body.transaction, &body.auth);
    match state.pipeline.sponsor_only(body, &agent_key, Some(&api_key)).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(failure) => relay_error_response(request_id, failure),
    }
}

/// Derives the per-agent rate-limit key (spec §4.7 step 2: "keyed on agent
/// address"). A recovered SIP-018 signer is the strongest signal; absent
/// that, this falls back to the transaction's own decoded sender so
/// unauthenticated `/relay` calls still rate-limit per sender rather than
/// globally. This is a second, throwaway decode purely for key derivation --
/// cheap byte parsing, not a correctness-bearing decode.
fn agent_key_for<D: TxDecoder>(state: &AppState<D>, tx_hex: &str, auth: &Option<Sip018Auth>) -> String {
    if let Some(auth) = auth {
        if let Some(key) = &auth.signer_public_key {
            return key.clone();
        }
    }
    state
        .decoder
        .decode(tx_hex)
        .map(|payment| payment.sender)
        .unwrap_or_else(|_| "unknown-agent".to_string())
}

/// `GET /supported`: static advertisement of the one scheme/network pair
/// this relay implements. Spec §6.
#[instrument(skip(state))]
pub async fn get_supported<D>(State(state): State<AppState<D>>) -> Response {
    (StatusCode::OK, Json(SupportedResponse::exact_on(&state.network_label))).into_response()
}

/// `GET /fees`: public, clamped fee estimates plus their source. Spec §6.
#[instrument(skip(state))]
pub async fn get_fees<D>(State(state): State<AppState<D>>) -> Response {
    let (estimates, source) = state.fee_service.get_estimates().await;
    (StatusCode::OK, Json(FeesResponse { estimates, source })).into_response()
}

/// `GET /verify/{receiptId}`: receipt status lookup. Spec §6.
#[instrument(skip(state))]
pub async fn get_verify_receipt<D>(State(state): State<AppState<D>>, Path(receipt_id): Path<Uuid>) -> Response {
    let request_id = Uuid::new_v4();
    match state.receipt_store.status(receipt_id) {
        Some(status) => {
            let status = match status {
                receipt_store::ReceiptStatus::Valid => WireReceiptStatus::Valid,
                receipt_store::ReceiptStatus::Consumed => WireReceiptStatus::Consumed,
            };
            (StatusCode::OK, Json(VerifyReceiptResponse { status })).into_response()
        }
        None => relay_error_response(
            request_id,
            RelayFailure::new(RelayErrorCode::NotFound, "receipt not found or expired"),
        ),
    }
}

/// `POST /access`: validates a receipt and, if `targetUrl` is supplied,
/// proxies to it with the sponsored transaction as proof of payment before
/// marking the receipt consumed. Spec §4.8/§6.
#[instrument(skip(state, body))]
pub async fn post_access<D>(State(state): State<AppState<D>>, Json(body): Json<AccessRequest>) -> Response {
    let request_id = Uuid::new_v4();
    let Some(receipt) = state.receipt_store.get(body.receipt_id) else {
        return relay_error_response(
            request_id,
            RelayFailure::new(RelayErrorCode::NotFound, "receipt not found or expired"),
        );
    };
    if receipt.consumed {
        return relay_error_response(
            request_id,
            RelayFailure::new(RelayErrorCode::ReceiptConsumed, "receipt already consumed"),
        );
    }
    if let (Some(expected), Some(declared)) = (&receipt.settle_options.resource, &body.resource) {
        if expected != declared {
            return relay_error_response(
                request_id,
                RelayFailure::new(RelayErrorCode::NotFound, "resource does not match receipt"),
            );
        }
    }

    if let Some(target_url) = &body.target_url {
        if let Err(err) = access_proxy::proxy_access(&state.http, &receipt.sponsored_tx_hex, target_url).await {
            return access_error_response(request_id, err);
        }
    }

    match state.receipt_store.mark_consumed(body.receipt_id) {
        receipt_store::ConsumeOutcome::Consumed => {
            (StatusCode::OK, Json(AccessResponse { success: true, request_id, receipt_id: body.receipt_id }))
                .into_response()
        }
        receipt_store::ConsumeOutcome::AlreadyConsumed => relay_error_response(
            request_id,
            RelayFailure::new(RelayErrorCode::ReceiptConsumed, "receipt already consumed"),
        ),
        receipt_store::ConsumeOutcome::Expired | receipt_store::ConsumeOutcome::NotFound => relay_error_response(
            request_id,
            RelayFailure::new(RelayErrorCode::NotFound, "receipt not found or expired"),
        ),
    }
}

fn access_error_response(request_id: Uuid, err: AccessError) -> Response {
    let code = match err {
        AccessError::InvalidUrl | AccessError::NonHttpsScheme | AccessError::DeniedHost => {
            RelayErrorCode::InvalidTransaction
        }
        AccessError::Transport(_) | AccessError::DownstreamFailure(_) => RelayErrorCode::BroadcastFailed,
    };
    relay_error_response(request_id, RelayFailure::new(code, &err.to_string()))
}

/// Builds the [`SettleOptions`] the decoded transaction must satisfy out of
/// the facilitator-surface `paymentRequirements`. Spec §6 `/settle`/`/verify`.
fn settle_options_from_requirements(
    requirements: &relay_types::proto::facilitator::PaymentRequirements,
    network_label: &str,
) -> Result<SettleOptions, FacilitatorErrorReason> {
    if requirements.scheme.is_empty() {
        return Err(FacilitatorErrorReason::InvalidScheme);
    }
    if requirements.scheme != "exact" {
        return Err(FacilitatorErrorReason::UnsupportedScheme);
    }
    if requirements.network != network_label {
        return Err(FacilitatorErrorReason::InvalidNetwork);
    }
    let min_amount = requirements
        .amount
        .parse::<Amount>()
        .map_err(|_| FacilitatorErrorReason::InvalidPaymentRequirements)?;
    if min_amount == Amount::zero() {
        return Err(FacilitatorErrorReason::InvalidPaymentRequirements);
    }
    let token_type = if requirements.asset == "native" {
        TokenType::Native
    } else {
        relay_types::known_tokens::token_type_by_contract(&requirements.asset)
            .ok_or(FacilitatorErrorReason::UnrecognizedAsset)?
    };
    if requirements.pay_to.trim().is_empty() {
        return Err(FacilitatorErrorReason::InvalidPaymentRequirements);
    }
    Ok(SettleOptions {
        expected_recipient: requirements.pay_to.clone(),
        min_amount,
        token_type,
        expected_sender: None,
        resource: None,
        method: None,
        max_timeout_seconds: requirements.max_timeout_seconds,
    })
}

fn payload_hash(request: &SettleRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.payment_payload.payload.transaction.as_bytes());
    hasher.update(request.payment_requirements.scheme.as_bytes());
    hasher.update(request.payment_requirements.network.as_bytes());
    hasher.update(request.payment_requirements.amount.as_bytes());
    hasher.update(request.payment_requirements.asset.as_bytes());
    hasher.update(request.payment_requirements.pay_to.as_bytes());
    hex::encode(hasher.finalize())
}

/// `POST /settle`: verifies a pre-sponsored transaction against
/// `paymentRequirements` and broadcasts it. No sponsor-sign step -- the
/// transaction already carries both auth conditions. Spec §4.6, §6.
#[instrument(skip(state, body))]
pub async fn post_settle<D: TxDecoder>(State(state): State<AppState<D>>, Json(body): Json<SettleRequest>) -> Response {
    let network = state.network_label.clone();
    if let Err(reason) = validate_payment_id_facilitator(&body.payment_id) {
        return settle_failure(body.payment_payload.payload.transaction.clone(), network, reason);
    }
    if let Some(id) = &body.payment_id {
        let hash = payload_hash(&body);
        match state.dedup_store.check_payment_id(id, &hash) {
            PaymentIdLookup::Hit(cached) => {
                return (StatusCode::OK, Json(cached)).into_response();
            }
            PaymentIdLookup::Conflict => {
                let response = SettleResponse {
                    success: false,
                    payer: None,
                    transaction: body.payment_payload.payload.transaction.clone(),
                    network,
                    error_reason: Some(FacilitatorErrorReason::PaymentIdentifierConflict),
                    extensions: None,
                };
                return (StatusCode::CONFLICT, Json(response)).into_response();
            }
            PaymentIdLookup::Miss => {}
        }
    }

    let options = match settle_options_from_requirements(&body.payment_requirements, &network) {
        Ok(options) => options,
        Err(reason) => {
            return settle_failure(body.payment_payload.payload.transaction.clone(), network, reason);
        }
    };

    let payment = match state.decoder.decode(&body.payment_payload.payload.transaction) {
        Ok(payment) => payment,
        Err(_) => {
            return settle_failure(
                body.payment_payload.payload.transaction.clone(),
                network,
                FacilitatorErrorReason::InvalidPayload,
            );
        }
    };
    if let Err(err) = settlement_engine::verify_payment_params(&payment, &options) {
        return settle_failure(
            body.payment_payload.payload.transaction.clone(),
            network,
            verify_error_reason(err),
        );
    }

    let tx_bytes = match hex::decode(body.payment_payload.payload.transaction.trim_start_matches("0x")) {
        Ok(bytes) => bytes,
        Err(_) => {
            return settle_failure(
                body.payment_payload.payload.transaction.clone(),
                network,
                FacilitatorErrorReason::InvalidPayload,
            );
        }
    };

    let response = match settlement_engine::broadcast_and_confirm(
        state.chain.as_ref(),
        &tx_bytes,
        options.max_poll_duration(),
    )
    .await
    {
        Ok(ConfirmOutcome::Success { .. }) | Ok(ConfirmOutcome::TimedOut { .. }) => SettleResponse {
            success: true,
            payer: None,
            transaction: body.payment_payload.payload.transaction.clone(),
            network: network.clone(),
            error_reason: None,
            extensions: None,
        },
        Ok(ConfirmOutcome::Abort { .. }) | Ok(ConfirmOutcome::Dropped { .. }) => SettleResponse {
            success: false,
            payer: None,
            transaction: body.payment_payload.payload.transaction.clone(),
            network: network.clone(),
            error_reason: Some(FacilitatorErrorReason::TransactionFailed),
            extensions: None,
        },
        Err(BroadcastError::NonceConflict { .. }) => SettleResponse {
            success: false,
            payer: None,
            transaction: body.payment_payload.payload.transaction.clone(),
            network: network.clone(),
            error_reason: Some(FacilitatorErrorReason::ConflictingNonce),
            extensions: None,
        },
        Err(_) => SettleResponse {
            success: false,
            payer: None,
            transaction: body.payment_payload.payload.transaction.clone(),
            network: network.clone(),
            error_reason: Some(FacilitatorErrorReason::BroadcastFailed),
            extensions: None,
        },
    };

    if let Some(id) = &body.payment_id {
        let hash = payload_hash(&body);
        state.dedup_store.record_payment_id(id, hash, serde_json::to_value(&response).unwrap_or_default());
    }
    (StatusCode::OK, Json(response)).into_response()
}

fn settle_failure(transaction: String, network: String, reason: FacilitatorErrorReason) -> Response {
    let status = StatusCode::from_u16(reason.http_status()).unwrap_or(StatusCode::OK);
    let response =
        SettleResponse { success: false, payer: None, transaction, network, error_reason: Some(reason), extensions: None };
    (status, Json(response)).into_response()
}

fn verify_failure(reason: FacilitatorErrorReason) -> Response {
    let status = StatusCode::from_u16(reason.http_status()).unwrap_or(StatusCode::OK);
    let response = VerifyResponse { is_valid: false, payer: None, invalid_reason: Some(reason), extensions: None };
    (status, Json(response)).into_response()
}

fn verify_error_reason(err: VerifyError) -> FacilitatorErrorReason {
    match err {
        VerifyError::RecipientMismatch => FacilitatorErrorReason::RecipientMismatch,
        VerifyError::SenderMismatch => FacilitatorErrorReason::RecipientMismatch,
        VerifyError::InsufficientAmount => FacilitatorErrorReason::AmountInsufficient,
        VerifyError::UnexpectedContractCall | VerifyError::MissingContractCall => {
            FacilitatorErrorReason::InvalidTransactionState
        }
        VerifyError::UnknownTokenContract | VerifyError::TokenTypeMismatch => {
            FacilitatorErrorReason::UnrecognizedAsset
        }
    }
}

/// `POST /verify`: verification only, no broadcast. Spec §4.6, §6.
#[instrument(skip(state, body))]
pub async fn post_verify<D: TxDecoder>(State(state): State<AppState<D>>, Json(body): Json<VerifyRequest>) -> Response {
    let network = state.network_label.clone();
    if let Err(reason) = validate_payment_id_facilitator(&body.payment_id) {
        return verify_failure(reason);
    }
    if let Some(id) = &body.payment_id {
        let hash = payload_hash(&body);
        match state.dedup_store.check_payment_id(id, &hash) {
            PaymentIdLookup::Hit(cached) => return (StatusCode::OK, Json(cached)).into_response(),
            PaymentIdLookup::Conflict => {
                let response = VerifyResponse {
                    is_valid: false,
                    payer: None,
                    invalid_reason: Some(FacilitatorErrorReason::PaymentIdentifierConflict),
                    extensions: None,
                };
                return (StatusCode::CONFLICT, Json(response)).into_response();
            }
            PaymentIdLookup::Miss => {}
        }
    }

    let options = match settle_options_from_requirements(&body.payment_requirements, &network) {
        Ok(options) => options,
        Err(reason) => return verify_failure(reason),
    };
    let payment = match state.decoder.decode(&body.payment_payload.payload.transaction) {
        Ok(payment) => payment,
        Err(_) => return verify_failure(FacilitatorErrorReason::InvalidPayload),
    };

    let response = match settlement_engine::verify_payment_params(&payment, &options) {
        Ok(()) => VerifyResponse { is_valid: true, payer: None, invalid_reason: None, extensions: None },
        Err(err) => {
            return verify_failure(verify_error_reason(err));
        }
    };

    if let Some(id) = &body.payment_id {
        let hash = payload_hash(&body);
        state.dedup_store.record_payment_id(id, hash, serde_json::to_value(&response).unwrap_or_default());
    }
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_id_validation_passes_absent_and_well_formed_ids() {
        assert!(validate_payment_id_relay(&None).is_ok());
        assert!(validate_payment_id_facilitator(&None).is_ok());
        let ok = Some("a".repeat(16));
        assert!(validate_payment_id_relay(&ok).is_ok());
        assert!(validate_payment_id_facilitator(&ok).is_ok());
    }

    #[test]
    fn payment_id_validation_rejects_malformed_ids() {
        let too_short = Some("short".to_string());
        let failure = validate_payment_id_relay(&too_short).unwrap_err();
        assert_eq!(failure.code, RelayErrorCode::InvalidTransaction);
        assert_eq!(
            validate_payment_id_facilitator(&too_short).unwrap_err(),
            FacilitatorErrorReason::InvalidPayload
        );
    }
}
