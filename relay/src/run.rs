//! Sponsored-transaction relay HTTP entrypoint.
//!
//! This binary launches an Axum-based HTTP server exposing the
//! sponsored-transaction relay's surface.
//!
//! This server includes:
//! - structured tracing, with optional OpenTelemetry export (`telemetry` feature)
//! - CORS support for cross-origin clients
//! - a pooled sponsor-wallet `SponsorPipeline` backed by a Hiro-compatible
//!   Stacks indexer
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `HOST`, `PORT` control binding address
//! - `OTEL_*` variables enable tracing to systems like Honeycomb

use axum::Router;
use axum::http::Method;
use dotenvy::dotenv;
use relay_chain_stacks::{StacksChainClient, StacksChainConfig};
use relay_core::api_key_store::ApiKeyStore;
use relay_core::dedup_store::DedupStore;
use relay_core::fee_service::FeeService;
use relay_core::handlers::{self, AppState};
use relay_core::quota_tracker::QuotaTracker;
use relay_core::rate_limiter::RateLimiter;
use relay_core::receipt_store::ReceiptStore;
use relay_core::sponsor_pipeline::{SponsorPipeline, SponsorWallet};
use relay_core::tx_decode::FixedLayoutDecoder;
use relay_core::util::{SigDown, Telemetry};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors;
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// Initializes the sponsored-transaction relay server.
///
/// - Loads `.env` variables.
/// - Bootstraps tracing (and OpenTelemetry export, when built with `telemetry`).
/// - Constructs the Stacks chain client, sponsor wallet pool and in-process
///   stores the HTTP surface is built on top of.
/// - Starts an Axum HTTP server with the relay's handlers.
///
/// Binds to the address specified by the `HOST` and `PORT` env vars.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .expect("Failed to initialize rustls crypto provider");

    dotenv().ok();
    let _telemetry = Telemetry::new();

    let config = Config::load()?;
    let network_label = config.network_label();

    let chain_config = StacksChainConfig::new(config.network, config.hiro_api_key.clone());
    let chain = Arc::new(StacksChainClient::new(chain_config)?);

    let wallets: Vec<SponsorWallet> = config
        .sponsor_keys
        .iter()
        .map(|key| SponsorWallet::new(sponsor_address_label(key), key.clone()))
        .collect();

    let fee_service = Arc::new(FeeService::new(chain.clone()));
    let dedup_store = Arc::new(DedupStore::new());
    let receipt_store = Arc::new(ReceiptStore::new());
    let rate_limiter = Arc::new(RateLimiter::new());
    let quota = Arc::new(QuotaTracker::new());
    let api_keys = Arc::new(ApiKeyStore::new());

    let pipeline = Arc::new(SponsorPipeline::new(
        chain.clone(),
        wallets,
        fee_service.clone(),
        dedup_store.clone(),
        receipt_store.clone(),
        rate_limiter,
        quota,
        FixedLayoutDecoder,
    ));

    let state = AppState {
        pipeline,
        chain: chain.clone(),
        fee_service,
        receipt_store,
        dedup_store,
        api_keys,
        http: reqwest::Client::new(),
        decoder: FixedLayoutDecoder,
        network_label,
        sip018_domain: handlers::sip018_domain(config.chain_id()),
    };

    let http_endpoints = Router::new()
        .merge(handlers::routes().with_state(state))
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let sig_down = SigDown::try_new()?;
    let axum_cancellation_token = sig_down.cancellation_token();
    let axum_graceful_shutdown = async move { axum_cancellation_token.cancelled().await };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(axum_graceful_shutdown)
        .await?;

    Ok(())
}

/// Derives a stable display label for a sponsor wallet. There's no Stacks
/// address-encoding (c32check) crate anywhere in the pack, so this stands in
/// for the real `SPxxx...`-style address the signing key would otherwise
/// produce; it's only used for nonce-coordinator bookkeeping and logging, not
/// wire-level identity.
fn sponsor_address_label(key: &k256::ecdsa::SigningKey) -> String {
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    use sha2::{Digest, Sha256};
    let encoded = key.verifying_key().to_encoded_point(true);
    let digest = Sha256::digest(encoded.as_bytes());
    format!("SPONSOR_{}", hex::encode(&digest[..10]).to_uppercase())
}
