//! Allow-list of SIP-010 token contracts the settlement engine accepts for
//! non-native payments.
//!
//! Grounded on the teacher's `known.rs` network registry: a static table
//! built once with [`once_cell::sync::Lazy`] and looked up by key, rather
//! than discovered at runtime.

use crate::settle_options::TokenType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One allow-listed SIP-010 token contract.
#[derive(Debug, Clone, Copy)]
pub struct KnownToken {
    pub contract_id: &'static str,
    pub token_type: TokenType,
}

/// The closed set of non-native token contracts the relay will sponsor
/// payments in. Spec §4.5: "contract-call / SIP-010 dispatch against a
/// known-token allow-list"; unlisted contracts are rejected outright.
static KNOWN_TOKENS: &[KnownToken] = &[
    KnownToken {
        contract_id: "SP3Y2ZSH8P7D50B0VBTSX11S7XSG24M1VB9YFQA4K.token-wbtc",
        token_type: TokenType::BridgedBtc,
    },
    KnownToken {
        contract_id: "SP3Y2ZSH8P7D50B0VBTSX11S7XSG24M1VB9YFQA4K.token-susdt",
        token_type: TokenType::Stablecoin,
    },
    KnownToken {
        contract_id: "SP2C2YFP12AJZB4MABJBAJ55XECVS7E4PMMZ89YZR.token-wstx",
        token_type: TokenType::Native,
    },
];

static KNOWN_TOKENS_BY_CONTRACT: Lazy<HashMap<&'static str, KnownToken>> = Lazy::new(|| {
    KNOWN_TOKENS
        .iter()
        .map(|token| (token.contract_id, *token))
        .collect()
});

/// Looks up the [`TokenType`] of an allow-listed SIP-010 contract.
///
/// Returns `None` for any contract not on the allow-list; callers must
/// reject the payment in that case rather than guess a token type.
pub fn token_type_by_contract(contract_id: &str) -> Option<TokenType> {
    KNOWN_TOKENS_BY_CONTRACT.get(contract_id).map(|t| t.token_type)
}

/// True if `contract_id` is on the allow-list, regardless of its token type.
pub fn is_known_contract(contract_id: &str) -> bool {
    KNOWN_TOKENS_BY_CONTRACT.contains_key(contract_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_contract_resolves_its_token_type() {
        assert_eq!(
            token_type_by_contract("SP3Y2ZSH8P7D50B0VBTSX11S7XSG24M1VB9YFQA4K.token-wbtc"),
            Some(TokenType::BridgedBtc)
        );
    }

    #[test]
    fn unknown_contract_resolves_to_none() {
        assert_eq!(token_type_by_contract("SP000000000000000000002Q6VF78.unknown"), None);
        assert!(!is_known_contract("SP000000000000000000002Q6VF78.unknown"));
    }
}
