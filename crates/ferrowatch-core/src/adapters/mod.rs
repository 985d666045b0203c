//! Provider adapters implementing [`PriceSource`](crate::PriceSource).

pub mod binance;
pub mod yahoo;

pub use binance::BinanceAdapter;
pub use yahoo::YahooAdapter;

use std::sync::Arc;

use tracing::debug;

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::data_source::{HealthState, HealthStatus, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::ProviderId;

/// Transport plus the guards every adapter applies before going upstream.
#[derive(Clone)]
pub(crate) struct Upstream {
    provider: ProviderId,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    budget: RateBudget,
}

impl Upstream {
    pub(crate) fn new(policy: &ProviderPolicy, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            provider: policy.provider_id,
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                policy.provider_id.as_str(),
                policy.circuit,
            )),
            budget: RateBudget::from_policy(policy),
        }
    }

    /// Executes a request and returns the body of a 2xx response.
    pub(crate) async fn fetch_body(&self, request: HttpRequest) -> Result<String, SourceError> {
        let provider = self.provider;
        if !self.circuit_breaker.allow_request() {
            return Err(SourceError::unavailable(format!(
                "{provider} circuit breaker is open; skipping upstream call"
            )));
        }
        if !self.budget.try_acquire() {
            return Err(SourceError::rate_limited(format!(
                "{provider} request budget exhausted"
            )));
        }

        debug!(%provider, url = %redact_query(&request.url), "upstream request");
        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.record_failure();
            if error.retryable() {
                SourceError::unavailable(format!("{provider} transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("{provider} transport error: {}", error.message()))
            }
        })?;

        if response.status == 429 || response.status == 418 {
            self.circuit_breaker.record_failure();
            return Err(SourceError::rate_limited(format!(
                "{provider} returned status {}",
                response.status
            )));
        }

        if !response.is_success() {
            // 4xx means a bad symbol, not an unhealthy upstream.
            if response.status >= 500 {
                self.circuit_breaker.record_failure();
            }
            return Err(SourceError::unavailable(format!(
                "{provider} returned status {}",
                response.status
            )));
        }

        self.circuit_breaker.record_success();
        Ok(response.body)
    }

    pub(crate) fn health(&self) -> HealthStatus {
        let state = match self.circuit_breaker.state() {
            CircuitState::Closed => HealthState::Healthy,
            CircuitState::HalfOpen => HealthState::Degraded,
            CircuitState::Open => HealthState::Unhealthy,
        };
        HealthStatus::new(state, self.budget.rate_available())
    }

    #[cfg(test)]
    pub(crate) fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }
}

fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

    /// Replays scripted responses in order and records every request.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        pub(crate) fn with(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let next = self
                .responses
                .lock()
                .expect("response script should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new("script exhausted")));
            Box::pin(async move { next })
        }
    }
}
