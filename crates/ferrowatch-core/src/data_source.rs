//! Price source trait and request/response types.
//!
//! This module defines the adapter contract ([`PriceSource`]) that every
//! market-data provider implements. The evaluator depends only on this trait,
//! never on a concrete provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use ferrowatch_core::{PriceSource, SeriesRequest, YahooAdapter};
//!
//! async fn last_close(adapter: &YahooAdapter) -> Option<f64> {
//!     let request = SeriesRequest::hourly("GC=F", 48).ok()?;
//!     adapter.fetch_closes(request).await.ok()?.last()
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Interval, PriceSeries, ProviderId};

/// Health state derived from recent upstream behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Runtime source health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub rate_available: bool,
}

impl HealthStatus {
    pub const fn new(state: HealthState, rate_available: bool) -> Self {
        Self {
            state,
            rate_available,
        }
    }

    pub const fn healthy() -> Self {
        Self::new(HealthState::Healthy, true)
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Timeout,
    AdapterNotRegistered,
    Internal,
}

/// Structured source error. Every kind means "no usable series this cycle";
/// the kind only decides how loudly it is logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn timeout(provider: ProviderId, timeout_ms: u128) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: format!("{provider} did not answer within {timeout_ms}ms"),
            retryable: true,
        }
    }

    pub fn adapter_not_registered(provider: ProviderId) -> Self {
        Self {
            kind: SourceErrorKind::AdapterNotRegistered,
            message: format!("source adapter '{provider}' is not registered"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::AdapterNotRegistered => "source.adapter_not_registered",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for close-price series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: String,
    pub interval: Interval,
    pub limit: usize,
}

impl SeriesRequest {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        limit: usize,
    ) -> Result<Self, SourceError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "series request symbol must not be empty",
            ));
        }
        if limit == 0 {
            return Err(SourceError::invalid_request(
                "series request limit must be greater than zero",
            ));
        }
        Ok(Self {
            symbol,
            interval,
            limit,
        })
    }

    pub fn hourly(symbol: impl Into<String>, limit: usize) -> Result<Self, SourceError> {
        Self::new(symbol, Interval::OneHour, limit)
    }
}

/// Boxed future returned by [`PriceSource::fetch_closes`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>>;

/// Price source adapter contract.
///
/// Implementations return at most `limit` closes in chronological order. An
/// empty or malformed upstream answer is reported as
/// [`SourceErrorKind::Unavailable`], never as an empty series.
///
/// Implementations must be `Send + Sync`; the scheduler shares them across
/// concurrently evaluated instruments.
pub trait PriceSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches recent close prices for a provider-specific symbol.
    fn fetch_closes<'a>(&'a self, req: SeriesRequest) -> FetchFuture<'a>;

    /// Returns the current health status of this source.
    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async { HealthStatus::healthy() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_request_rejects_zero_limit() {
        let err = SeriesRequest::hourly("GC=F", 0).expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
        assert!(!err.retryable());
    }

    #[test]
    fn series_request_rejects_blank_symbol() {
        let err = SeriesRequest::hourly("  ", 10).expect_err("must fail");
        assert_eq!(err.code(), "source.invalid_request");
    }

    #[test]
    fn timeout_error_names_provider() {
        let err = SourceError::timeout(ProviderId::Binance, 10_000);
        assert_eq!(err.kind(), SourceErrorKind::Timeout);
        assert_eq!(
            err.to_string(),
            "binance did not answer within 10000ms (source.timeout)"
        );
    }
}
