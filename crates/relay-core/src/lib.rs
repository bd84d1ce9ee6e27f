#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core relay implementation for the sponsored-transaction relay.
//!
//! This crate provides the stateful pieces the HTTP surface is built on top
//! of, and the surface itself:
//!
//! - [`api_key_store`] - cached caller-authentication metadata
//! - [`nonce_coordinator`] - per-wallet single-writer nonce pool actor
//! - [`fee_service`] - cached, clamped fee estimates
//! - [`dedup_store`] - tx-fingerprint and payment-identifier dedup
//! - [`receipt_store`] - receipt persistence and atomic consumption
//! - [`rate_limiter`] - per-agent request rate limiting
//! - [`quota_tracker`] - per-API-key daily request/fee-cap quota
//! - [`sip018`] - SIP-018 structured-data signature verification
//! - [`settlement_engine`] - payment verification and broadcast/confirm polling
//! - [`tx_decode`] - decoding payment fields out of a sponsored transaction
//! - [`sponsor_pipeline`] - the `/relay`/`/sponsor` request lifecycle
//! - [`access_proxy`] - the SSRF-guarded `/access` downstream proxy
//! - [`handlers`] - the axum HTTP surface
//! - [`util`] - graceful shutdown and telemetry bootstrap

pub mod access_proxy;
pub mod api_key_store;
pub mod dedup_store;
pub mod fee_service;
pub mod handlers;
pub mod nonce_coordinator;
pub mod quota_tracker;
pub mod rate_limiter;
pub mod receipt_store;
pub mod settlement_engine;
pub mod sip018;
pub mod sponsor_pipeline;
pub mod tx_decode;
pub mod util;
