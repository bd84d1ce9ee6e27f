#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the sponsored-transaction relay.
//!
//! This crate is the domain model shared by every other crate in the
//! workspace: the chain client contract, the wire protocol for the
//! proprietary (`/relay`, `/sponsor`) and spec-compliant facilitator
//! (`/settle`, `/verify`, `/supported`) endpoints, and the data model for
//! nonce pools, receipts, dedup entries and fee clamps described in the
//! design document.
//!
//! # Modules
//!
//! - [`chain`] - The [`chain::ChainClient`] trait every chain backend implements
//! - [`proto`] - Wire types and the closed error-code taxonomy
//! - [`settle_options`] - Declared payment requirements (`SettleOptions`)
//! - [`nonce`] - Per-wallet nonce pool data model
//! - [`receipt`] - Sponsorship receipts
//! - [`dedup`] - Content-addressed and client-supplied idempotency entries
//! - [`fee`] - Fee estimates and per-tx-type clamp configuration
//! - [`api_key`] - API-key metadata and tier limits
//! - [`known_tokens`] - Hard-coded allow-list of supported SIP-010 contracts
//! - [`money`] - Non-negative smallest-unit integer amounts
//! - [`timestamp`] - Unix timestamp and TTL helpers

pub mod api_key;
pub mod chain;
pub mod dedup;
pub mod fee;
pub mod known_tokens;
pub mod money;
pub mod nonce;
pub mod proto;
pub mod receipt;
pub mod settle_options;
pub mod timestamp;
