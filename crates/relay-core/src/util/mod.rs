//! Helper types shared across the relay crate:
//!
//! - [`sig_down`] - Graceful shutdown signal handling
//! - [`telemetry`] - Tracing/OpenTelemetry bootstrap

pub mod sig_down;
pub mod telemetry;

pub use sig_down::*;
pub use telemetry::*;
