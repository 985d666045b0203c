//! Core engine for ferrowatch.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Price source trait, provider adapters and feed routing
//! - Movement and reversal detectors with trade level derivation
//! - Per-instrument evaluation, notifiers and the cycle scheduler
//! - Watch configuration (defaults, TOML overrides, credentials)

pub mod adapters;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod detection;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod http_client;
pub mod notifier;
pub mod provider_policy;
pub mod routing;
pub mod scheduler;
pub mod source;
pub mod synthetic;
pub mod throttling;

pub use adapters::{BinanceAdapter, YahooAdapter};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{
    ConfigError, DetectionSettings, ScheduleSettings, TelegramCredentials, WatchConfig,
};
pub use data_source::{
    FetchFuture, HealthState, HealthStatus, PriceSource, SeriesRequest, SourceError,
    SourceErrorKind,
};
pub use detection::{DetectorError, MovementDetector, ReversalDetector};
pub use domain::{
    round_price, Alert, Direction, Feed, Instrument, InstrumentId, InstrumentKind, Interval,
    Levels, PriceSeries, Signal, SignalKind, UtcDateTime,
};
pub use error::ValidationError;
pub use evaluator::{EvaluationAnomaly, InstrumentEvaluator, InstrumentOutcome};
pub use http_client::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
pub use notifier::{DeliverFuture, DeliveryError, LogNotifier, Notifier, TelegramNotifier};
pub use provider_policy::ProviderPolicy;
pub use routing::{RouteFailure, RouteResult, RouteSuccess, SourceRouter, SourceSnapshot};
pub use scheduler::{CycleReport, DeliveryFailure, InstrumentReport, Scheduler};
pub use source::ProviderId;
pub use synthetic::ratio_series;
pub use throttling::RateBudget;
