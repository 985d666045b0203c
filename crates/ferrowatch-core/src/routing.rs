use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::adapters::{BinanceAdapter, YahooAdapter};
use crate::data_source::{HealthState, HealthStatus, PriceSource, SeriesRequest, SourceError};
use crate::{Feed, PriceSeries, ProviderId};

/// Series fetched through a feed chain.
#[derive(Debug, Clone)]
pub struct RouteSuccess {
    pub series: PriceSeries,
    pub selected_feed: Feed,
    /// Failures of feeds tried before the selected one.
    pub errors: Vec<SourceError>,
}

/// Every feed in the chain failed or returned too few closes.
#[derive(Debug, Clone)]
pub struct RouteFailure {
    pub errors: Vec<SourceError>,
}

impl RouteFailure {
    /// The error reported for the instrument: the last attempt's.
    pub fn into_error(self) -> SourceError {
        self.errors
            .into_iter()
            .last()
            .unwrap_or_else(|| SourceError::unavailable("no feed configured"))
    }
}

pub type RouteResult = Result<RouteSuccess, RouteFailure>;

/// Adapter health as reported by the `sources` snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SourceSnapshot {
    pub id: ProviderId,
    pub health: HealthStatus,
}

impl SourceSnapshot {
    pub fn status_label(self) -> &'static str {
        if !self.health.rate_available {
            return "rate_limited";
        }

        match self.health.state {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Adapter registry and feed-chain routing.
pub struct SourceRouter {
    adapters: HashMap<ProviderId, Arc<dyn PriceSource>>,
    call_timeout: Duration,
}

impl Default for SourceRouter {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(YahooAdapter::default()),
            Arc::new(BinanceAdapter::default()),
        ])
    }
}

impl SourceRouter {
    pub fn new(adapters: Vec<Arc<dyn PriceSource>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self {
            adapters,
            call_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub async fn snapshot(&self, provider: ProviderId) -> Option<SourceSnapshot> {
        let adapter = self.adapters.get(&provider)?;
        Some(SourceSnapshot {
            id: provider,
            health: adapter.health().await,
        })
    }

    /// Fetches one feed, bounded by the call timeout.
    ///
    /// Circuit and rate gating happen inside the adapter, so a provider that
    /// recovers is picked up again without restarting.
    pub async fn fetch_feed(&self, feed: &Feed, limit: usize) -> Result<PriceSeries, SourceError> {
        let provider = feed.source;
        let Some(adapter) = self.adapters.get(&provider) else {
            return Err(SourceError::adapter_not_registered(provider));
        };

        let request = SeriesRequest::hourly(feed.symbol.as_str(), limit)?;
        match tokio::time::timeout(self.call_timeout, adapter.fetch_closes(request)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::timeout(provider, self.call_timeout.as_millis())),
        }
    }

    /// Tries each feed in order until one yields at least `min_samples` closes.
    pub async fn route_series(
        &self,
        feeds: &[&Feed],
        limit: usize,
        min_samples: usize,
    ) -> RouteResult {
        let mut errors = Vec::new();

        for feed in feeds {
            match self.fetch_feed(feed, limit).await {
                Ok(series) if series.len() >= min_samples => {
                    return Ok(RouteSuccess {
                        series,
                        selected_feed: (*feed).clone(),
                        errors,
                    });
                }
                Ok(series) => {
                    debug!(%feed, samples = series.len(), "feed returned too few closes");
                    errors.push(SourceError::unavailable(format!(
                        "{feed} returned {} closes, need {min_samples}",
                        series.len()
                    )));
                }
                Err(error) => {
                    debug!(%feed, %error, "feed failed");
                    errors.push(error);
                }
            }
        }

        Err(RouteFailure { errors })
    }

    pub fn registered(&self) -> Vec<ProviderId> {
        let mut providers = self.adapters.keys().copied().collect::<Vec<_>>();
        providers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        providers
    }
}
