//! `ChainClient` implementation talking to a Hiro-compatible Stacks indexer.

pub mod client;
pub mod config;

pub use client::StacksChainClient;
pub use config::{StacksChainConfig, StacksNetwork};
