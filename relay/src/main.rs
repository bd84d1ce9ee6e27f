//! Sponsored-transaction relay HTTP entrypoint.
//!
//! This binary launches an Axum-based HTTP server exposing the
//! sponsored-transaction relay's proprietary surface
//! (`/relay`, `/sponsor`, `/fees`, `/verify/{receiptId}`, `/access`) and the
//! spec-compliant facilitator triplet (`/settle`, `/verify`, `/supported`).
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `SPONSOR_PRIVATE_KEY`, `SPONSOR_WALLET_COUNT`, `STACKS_NETWORK`,
//!   `HIRO_API_KEY`, `HOST`, `PORT` control the sponsor pool and binding
//! - `OTEL_*` variables enable tracing export when built with `telemetry`

mod config;
mod run;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        println!("{e}");
        process::exit(1)
    }
}
