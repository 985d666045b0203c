use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::ProviderId;

/// Request budget and failure tolerance for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub circuit: CircuitBreakerConfig,
}

impl ProviderPolicy {
    /// Yahoo's chart endpoint is unofficial; stay well under its informal limits.
    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            circuit: CircuitBreakerConfig::default(),
        }
    }

    /// Binance klines cost 2 weight of a 6000/minute budget.
    pub fn binance_default() -> Self {
        Self {
            provider_id: ProviderId::Binance,
            quota_window: Duration::from_secs(60),
            quota_limit: 600,
            circuit: CircuitBreakerConfig::default(),
        }
    }
}
