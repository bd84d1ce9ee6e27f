//! Connection settings for the Stacks/Hiro-compatible indexer.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StacksNetwork {
    Mainnet,
    Testnet,
}

impl StacksNetwork {
    pub fn api_base_url(&self) -> &'static str {
        match self {
            StacksNetwork::Mainnet => "https://api.hiro.so",
            StacksNetwork::Testnet => "https://api.testnet.hiro.so",
        }
    }

    /// A human-facing explorer link for `txid`. Spec §6: success responses
    /// for transaction-producing endpoints include `explorerUrl`.
    pub fn explorer_url(&self, txid: &str) -> String {
        let chain = match self {
            StacksNetwork::Mainnet => "mainnet",
            StacksNetwork::Testnet => "testnet",
        };
        format!("https://explorer.hiro.so/txid/0x{}?chain={chain}", txid.trim_start_matches("0x"))
    }
}

impl std::str::FromStr for StacksNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(StacksNetwork::Mainnet),
            "testnet" => Ok(StacksNetwork::Testnet),
            other => Err(format!("unknown STACKS_NETWORK: {other} (expected mainnet|testnet)")),
        }
    }
}

/// Configuration for [`crate::client::StacksChainClient`].
#[derive(Debug, Clone)]
pub struct StacksChainConfig {
    pub network: StacksNetwork,
    /// Optional Hiro API key, sent as the `x-api-key` header. Unauthenticated
    /// requests are rate-limited more aggressively by the upstream indexer.
    pub hiro_api_key: Option<String>,
    pub request_timeout: Duration,
}

impl StacksChainConfig {
    pub fn new(network: StacksNetwork, hiro_api_key: Option<String>) -> Self {
        StacksChainConfig {
            network,
            hiro_api_key,
            request_timeout: relay_types::chain::CHAIN_CLIENT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_url_is_per_network_and_strips_0x() {
        assert_eq!(
            StacksNetwork::Mainnet.explorer_url("0xabc123"),
            "https://explorer.hiro.so/txid/0xabc123?chain=mainnet"
        );
        assert_eq!(
            StacksNetwork::Testnet.explorer_url("abc123"),
            "https://explorer.hiro.so/txid/0xabc123?chain=testnet"
        );
    }
}
