//! Environment-driven configuration. Spec §6 "Configuration".
//!
//! Grounded on the teacher's `CliArgs`/`Config::load()` pattern
//! (clap-derived args with `env` fallbacks, fallible construction behind a
//! closed error enum), simplified for a single-chain deployment: the
//! teacher's config is a CAIP-2-keyed multi-chain JSON document loaded from
//! a file path; this relay has exactly one chain and one sponsor-wallet
//! pool, so every setting is read directly from the environment, with
//! `clap`'s `env` attribute still providing flag-based overrides.

use clap::Parser;
use k256::ecdsa::SigningKey;
use relay_chain_stacks::StacksNetwork;
use std::net::IpAddr;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
/// Spec §4.2: a deployment runs at most 10 sponsor wallets.
const MAX_SPONSOR_WALLETS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SPONSOR_PRIVATE_KEY is required (comma-separated hex-encoded secp256k1 keys)")]
    MissingSponsorKey,
    #[error("SPONSOR_PRIVATE_KEY entry {0} is not a valid hex-encoded secp256k1 key")]
    InvalidSponsorKey(usize),
    #[error("SPONSOR_WALLET_COUNT must be between 1 and {MAX_SPONSOR_WALLETS}, got {0}")]
    InvalidWalletCount(usize),
    #[error("STACKS_NETWORK is invalid: {0}")]
    InvalidNetwork(String),
    #[error("HOST is not a valid IP address: {0}")]
    InvalidHost(String),
}

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Sponsored-transaction relay for a Stacks-compatible chain")]
struct CliArgs {
    /// Comma-separated hex-encoded secp256k1 sponsor private keys. Spec §6.
    #[arg(long, env = "SPONSOR_PRIVATE_KEY")]
    sponsor_private_key: Option<String>,

    /// Number of sponsor wallets to run. Spec §4.2: max 10.
    #[arg(long, env = "SPONSOR_WALLET_COUNT", default_value_t = 1)]
    sponsor_wallet_count: usize,

    /// `mainnet` or `testnet`. Spec §6.
    #[arg(long, env = "STACKS_NETWORK", default_value = "mainnet")]
    stacks_network: String,

    /// Hiro API key, sent as `x-api-key` to the indexer. Optional; the
    /// indexer just rate-limits unauthenticated callers more aggressively.
    #[arg(long, env = "HIRO_API_KEY")]
    hiro_api_key: Option<String>,

    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

/// Fully parsed, validated runtime configuration.
pub struct Config {
    pub sponsor_keys: Vec<SigningKey>,
    pub network: StacksNetwork,
    pub hiro_api_key: Option<String>,
    pub host: IpAddr,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();

        if args.sponsor_wallet_count == 0 || args.sponsor_wallet_count > MAX_SPONSOR_WALLETS {
            return Err(ConfigError::InvalidWalletCount(args.sponsor_wallet_count));
        }

        let raw_keys = args.sponsor_private_key.ok_or(ConfigError::MissingSponsorKey)?;
        let mut sponsor_keys = Vec::new();
        for (index, entry) in raw_keys.split(',').map(str::trim).filter(|s| !s.is_empty()).enumerate() {
            let bytes = hex::decode(entry.trim_start_matches("0x"))
                .map_err(|_| ConfigError::InvalidSponsorKey(index))?;
            let key = SigningKey::from_slice(&bytes).map_err(|_| ConfigError::InvalidSponsorKey(index))?;
            sponsor_keys.push(key);
        }
        if sponsor_keys.is_empty() {
            return Err(ConfigError::MissingSponsorKey);
        }
        sponsor_keys.truncate(args.sponsor_wallet_count.max(1).min(sponsor_keys.len().max(1)));

        let network =
            StacksNetwork::from_str(&args.stacks_network).map_err(ConfigError::InvalidNetwork)?;

        let host: IpAddr = args.host.parse().map_err(|_| ConfigError::InvalidHost(args.host.clone()))?;

        Ok(Config { sponsor_keys, network, hiro_api_key: args.hiro_api_key, host, port: args.port })
    }

    pub fn chain_id(&self) -> u32 {
        match self.network {
            StacksNetwork::Mainnet => 1,
            StacksNetwork::Testnet => 2147483648,
        }
    }

    pub fn network_label(&self) -> String {
        format!("stacks:{}", self.chain_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_distinguishes_networks() {
        let mainnet = Config {
            sponsor_keys: Vec::new(),
            network: StacksNetwork::Mainnet,
            hiro_api_key: None,
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
        };
        let testnet = Config { network: StacksNetwork::Testnet, ..mainnet_like(&mainnet) };
        assert_ne!(mainnet.chain_id(), testnet.chain_id());
        assert_eq!(mainnet.network_label(), "stacks:1");
    }

    fn mainnet_like(config: &Config) -> Config {
        Config {
            sponsor_keys: Vec::new(),
            network: config.network,
            hiro_api_key: config.hiro_api_key.clone(),
            host: config.host,
            port: config.port,
        }
    }
}
