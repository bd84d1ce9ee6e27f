//! Wire protocol types for the relay's HTTP surface, spec §6.
//!
//! Mirrors the teacher's `x402_types::proto` layout: one module per concern
//! (closed error-code enums, proprietary relay requests, spec-compliant
//! facilitator requests), all serializing camelCase over JSON.

pub mod error;
pub mod facilitator;
pub mod relay;

pub use error::{FacilitatorErrorReason, RelayErrorCode};
