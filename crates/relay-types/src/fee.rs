//! Fee estimates and per-transaction-type clamp configuration.
//!
//! See spec §3 ("Fee-clamp config") and §4.3 (Fee Service).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The payload classes the chain's fee estimator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    TokenTransfer,
    ContractCall,
    SmartContract,
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxType::TokenTransfer => "token_transfer",
            TxType::ContractCall => "contract_call",
            TxType::SmartContract => "smart_contract",
        };
        write!(f, "{s}")
    }
}

/// Low/medium/high fee priority tiers, in smallest-unit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl FeeTier {
    pub fn clamp(&self, clamp: &FeeClamp) -> FeeTier {
        FeeTier {
            low: self.low.clamp(clamp.floor, clamp.ceiling),
            medium: self.medium.clamp(clamp.floor, clamp.ceiling),
            high: self.high.clamp(clamp.floor, clamp.ceiling),
        }
    }
}

/// Raw fee estimates for every transaction-payload class, as returned by the
/// chain client before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimates {
    pub token_transfer: FeeTier,
    pub contract_call: FeeTier,
    pub smart_contract: FeeTier,
}

impl FeeEstimates {
    pub fn tier_for(&self, tx_type: TxType) -> FeeTier {
        match tx_type {
            TxType::TokenTransfer => self.token_transfer,
            TxType::ContractCall => self.contract_call,
            TxType::SmartContract => self.smart_contract,
        }
    }

    /// Floor-valued defaults used when the indexer is unreachable and no
    /// cached estimate survives. See spec §4.3 fallback order: cache ->
    /// fresh fetch -> floor-valued defaults.
    pub fn from_floors(config: &FeeClampConfig) -> FeeEstimates {
        let at_floor = |c: &FeeClamp| FeeTier {
            low: c.floor,
            medium: c.floor,
            high: c.floor,
        };
        FeeEstimates {
            token_transfer: at_floor(&config.token_transfer),
            contract_call: at_floor(&config.contract_call),
            smart_contract: at_floor(&config.smart_contract),
        }
    }
}

/// A floor/ceiling pair applied to every priority tier of one transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeClamp {
    pub floor: u64,
    pub ceiling: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeeClampConfigError {
    #[error("clamp floor and ceiling must both be positive")]
    NonPositive,
    #[error("clamp floor must be strictly less than ceiling")]
    FloorNotBelowCeiling,
}

impl FeeClamp {
    pub fn validate(&self) -> Result<(), FeeClampConfigError> {
        if self.floor == 0 || self.ceiling == 0 {
            return Err(FeeClampConfigError::NonPositive);
        }
        if self.floor >= self.ceiling {
            return Err(FeeClampConfigError::FloorNotBelowCeiling);
        }
        Ok(())
    }
}

/// One clamp entry per transaction type (spec §3: "Fee-clamp config").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeClampConfig {
    pub token_transfer: FeeClamp,
    pub contract_call: FeeClamp,
    pub smart_contract: FeeClamp,
}

impl FeeClampConfig {
    pub fn validate(&self) -> Result<(), FeeClampConfigError> {
        self.token_transfer.validate()?;
        self.contract_call.validate()?;
        self.smart_contract.validate()
    }

    pub fn clamp_for(&self, tx_type: TxType) -> FeeClamp {
        match tx_type {
            TxType::TokenTransfer => self.token_transfer,
            TxType::ContractCall => self.contract_call,
            TxType::SmartContract => self.smart_contract,
        }
    }
}

impl Default for FeeClampConfig {
    fn default() -> Self {
        FeeClampConfig {
            token_transfer: FeeClamp { floor: 180, ceiling: 50_000 },
            contract_call: FeeClamp { floor: 400, ceiling: 150_000 },
            smart_contract: FeeClamp { floor: 1_000, ceiling: 500_000 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_every_tier() {
        let raw = FeeTier { low: 1, medium: 1_000_000, high: 50 };
        let clamp = FeeClamp { floor: 10, ceiling: 100 };
        let clamped = raw.clamp(&clamp);
        assert_eq!(clamped, FeeTier { low: 10, medium: 100, high: 50 });
    }

    #[test]
    fn validate_rejects_zero_and_inverted_bounds() {
        assert_eq!(
            FeeClamp { floor: 0, ceiling: 10 }.validate(),
            Err(FeeClampConfigError::NonPositive)
        );
        assert_eq!(
            FeeClamp { floor: 10, ceiling: 10 }.validate(),
            Err(FeeClampConfigError::FloorNotBelowCeiling)
        );
        assert_eq!(
            FeeClamp { floor: 11, ceiling: 10 }.validate(),
            Err(FeeClampConfigError::FloorNotBelowCeiling)
        );
        assert!(FeeClamp { floor: 10, ceiling: 11 }.validate().is_ok());
    }

    #[test]
    fn floor_defaults_use_floor_for_every_tier() {
        let config = FeeClampConfig::default();
        let estimates = FeeEstimates::from_floors(&config);
        assert_eq!(estimates.token_transfer.low, config.token_transfer.floor);
        assert_eq!(estimates.token_transfer.high, config.token_transfer.floor);
    }
}
