//! Per-instrument evaluation: fetch, detect, level.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data_source::SourceError;
use crate::detection::{self, DetectorError};
use crate::routing::{RouteFailure, SourceRouter};
use crate::synthetic::ratio_series;
use crate::{
    Alert, Feed, Instrument, InstrumentId, InstrumentKind, Levels, PriceSeries, UtcDateTime,
    ValidationError, WatchConfig,
};

/// A series that cannot be classified or leveled.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationAnomaly {
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Levels(#[from] ValidationError),
}

/// Result of evaluating one instrument in one cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentOutcome {
    Signal {
        alert: Alert,
    },
    NoSignal {
        samples: usize,
    },
    Unavailable {
        error: SourceError,
    },
    Anomaly {
        #[serde(serialize_with = "serialize_display")]
        error: EvaluationAnomaly,
    },
    Panicked {
        message: String,
    },
}

impl InstrumentOutcome {
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Self::Signal { alert } => Some(alert),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Signal { .. } => "signal",
            Self::NoSignal { .. } => "no_signal",
            Self::Unavailable { .. } => "unavailable",
            Self::Anomaly { .. } => "anomaly",
            Self::Panicked { .. } => "panicked",
        }
    }
}

fn serialize_display<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: std::fmt::Display,
{
    serializer.collect_str(value)
}

/// Evaluates instruments against the shared configuration and sources.
#[derive(Clone)]
pub struct InstrumentEvaluator {
    config: Arc<WatchConfig>,
    router: Arc<SourceRouter>,
}

impl InstrumentEvaluator {
    pub fn new(config: Arc<WatchConfig>, router: Arc<SourceRouter>) -> Self {
        Self { config, router }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Produces at most one leveled signal for `instrument`.
    pub async fn evaluate(&self, instrument: &Instrument) -> InstrumentOutcome {
        match self.load_series(instrument).await {
            Ok(series) => self.classify(&instrument.id, &series),
            Err(error) => {
                debug!(instrument = %instrument.id, %error, "series unavailable");
                InstrumentOutcome::Unavailable { error }
            }
        }
    }

    /// Runs detection and level derivation on an already fetched series.
    pub fn classify(&self, instrument: &InstrumentId, series: &PriceSeries) -> InstrumentOutcome {
        let leveled = detection::detect(series, &self.config.detection)
            .map_err(EvaluationAnomaly::from)
            .and_then(|signal| {
                signal
                    .map(|signal| {
                        Levels::derive(signal.reference_price(), signal.direction())
                            .map(|levels| (signal, levels))
                    })
                    .transpose()
                    .map_err(EvaluationAnomaly::from)
            });

        match leveled {
            Ok(Some((signal, levels))) => InstrumentOutcome::Signal {
                alert: Alert {
                    instrument: instrument.clone(),
                    signal,
                    levels,
                    detected_at: UtcDateTime::now(),
                },
            },
            Ok(None) => InstrumentOutcome::NoSignal {
                samples: series.len(),
            },
            Err(error) => {
                warn!(%instrument, %error, "series anomaly");
                InstrumentOutcome::Anomaly { error }
            }
        }
    }

    async fn load_series(&self, instrument: &Instrument) -> Result<PriceSeries, SourceError> {
        match &instrument.kind {
            InstrumentKind::Direct { primary, fallback } => {
                self.load_direct(primary.as_ref(), fallback.as_ref()).await
            }
            InstrumentKind::Synthetic {
                numerator,
                denominator,
            } => {
                let (numerator, denominator) =
                    tokio::join!(self.load_leg(numerator), self.load_leg(denominator));
                ratio_series(&numerator?, &denominator?, self.config.detection.min_samples)
            }
        }
    }

    async fn load_leg(&self, id: &InstrumentId) -> Result<PriceSeries, SourceError> {
        match self.config.instrument(id).map(|leg| &leg.kind) {
            Some(InstrumentKind::Direct { primary, fallback }) => {
                self.load_direct(primary.as_ref(), fallback.as_ref()).await
            }
            Some(InstrumentKind::Synthetic { .. }) => Err(SourceError::invalid_request(format!(
                "synthetic leg '{id}' is itself synthetic"
            ))),
            None => Err(SourceError::invalid_request(format!(
                "synthetic leg '{id}' is not registered"
            ))),
        }
    }

    async fn load_direct(
        &self,
        primary: Option<&Feed>,
        fallback: Option<&Feed>,
    ) -> Result<PriceSeries, SourceError> {
        let feeds = primary.into_iter().chain(fallback).collect::<Vec<_>>();
        let detection = &self.config.detection;
        let routed = self
            .router
            .route_series(&feeds, detection.fetch_samples, detection.min_samples)
            .await
            .map_err(RouteFailure::into_error)?;

        if !routed.errors.is_empty() {
            debug!(feed = %routed.selected_feed, failed = routed.errors.len(), "fallback feed used");
        }
        Ok(routed.series)
    }
}
