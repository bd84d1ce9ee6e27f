//! Fee estimate caching and clamping. Spec §4.3.

use relay_chain_stacks::StacksChainClient;
use relay_types::fee::{FeeClampConfig, FeeClampConfigError, FeeEstimates};
use relay_types::proto::relay::FeeSource;
use relay_types::timestamp::UnixTimestamp;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

/// Cache TTL for `fee:estimates`. Spec §4.3.
const ESTIMATE_CACHE_TTL: Duration = Duration::from_secs(60);

struct CachedEstimates {
    estimates: FeeEstimates,
    cached_at: UnixTimestamp,
}

struct State {
    cache: Option<CachedEstimates>,
    rate_limited_until: Option<UnixTimestamp>,
    config: FeeClampConfig,
}

/// `fee:estimates` / `fee:config` / `fee:rate_limited_until`. Spec §6
/// "Persisted state layout". In-process, mirroring the teacher's per-process
/// 60 s estimate cache rather than round-tripping through the shared KV
/// store on every request.
pub struct FeeService {
    chain: Arc<StacksChainClient>,
    state: RwLock<State>,
}

impl FeeService {
    pub fn new(chain: Arc<StacksChainClient>) -> Self {
        FeeService {
            chain,
            state: RwLock::new(State {
                cache: None,
                rate_limited_until: None,
                config: FeeClampConfig::default(),
            }),
        }
    }

    /// Fallback order: cache -> fresh fetch -> floor-valued defaults. Spec §4.3.
    pub async fn get_estimates(&self) -> (FeeEstimates, FeeSource) {
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));

        {
            let state = self.state.read().await;
            if let Some(cached) = &state.cache {
                if now.0.saturating_sub(cached.cached_at.0) < ESTIMATE_CACHE_TTL.as_secs() {
                    return (state.config.clamp_estimates(cached.estimates), FeeSource::Cache);
                }
            }
            if let Some(until) = state.rate_limited_until {
                if !until.is_past(now) {
                    return match &state.cache {
                        Some(cached) => (state.config.clamp_estimates(cached.estimates), FeeSource::Cache),
                        None => (FeeEstimates::from_floors(&state.config), FeeSource::Default),
                    };
                }
            }
        }

        match self.chain.get_fee_estimates().await {
            Ok(raw) => {
                let mut state = self.state.write().await;
                state.cache = Some(CachedEstimates { estimates: raw, cached_at: now });
                (state.config.clamp_estimates(raw), FeeSource::Hiro)
            }
            Err(err) => {
                warn!(?err, "fee estimate fetch failed, falling back");
                let mut state = self.state.write().await;
                state.rate_limited_until = Some(now + 30);
                match &state.cache {
                    Some(cached) => (state.config.clamp_estimates(cached.estimates), FeeSource::Cache),
                    None => (FeeEstimates::from_floors(&state.config), FeeSource::Default),
                }
            }
        }
    }

    pub async fn set_clamp_config(&self, config: FeeClampConfig) -> Result<(), FeeClampConfigError> {
        config.validate()?;
        let mut state = self.state.write().await;
        state.config = config;
        state.cache = None;
        Ok(())
    }
}

trait ClampEstimates {
    fn clamp_estimates(&self, raw: FeeEstimates) -> FeeEstimates;
}

impl ClampEstimates for FeeClampConfig {
    fn clamp_estimates(&self, raw: FeeEstimates) -> FeeEstimates {
        FeeEstimates {
            token_transfer: raw.token_transfer.clamp(&self.token_transfer),
            contract_call: raw.contract_call.clamp(&self.contract_call),
            smart_contract: raw.smart_contract.clamp(&self.smart_contract),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::fee::{FeeClamp, FeeTier};

    #[test]
    fn clamp_estimates_bounds_every_tx_type() {
        let config = FeeClampConfig {
            token_transfer: FeeClamp { floor: 100, ceiling: 200 },
            contract_call: FeeClamp { floor: 100, ceiling: 200 },
            smart_contract: FeeClamp { floor: 100, ceiling: 200 },
        };
        let raw = FeeEstimates {
            token_transfer: FeeTier { low: 1, medium: 150, high: 10_000 },
            contract_call: FeeTier { low: 1, medium: 150, high: 10_000 },
            smart_contract: FeeTier { low: 1, medium: 150, high: 10_000 },
        };
        let clamped = config.clamp_estimates(raw);
        assert_eq!(clamped.token_transfer.low, 100);
        assert_eq!(clamped.token_transfer.high, 200);
        assert_eq!(clamped.token_transfer.medium, 150);
    }
}
