//! Price event detectors.
//!
//! Each detector returns `Ok(None)` for "nothing happened" and
//! `Err(DetectorError)` when the series makes the rule undefined, so an
//! anomalous feed (a zero close) is never mistaken for a quiet market.

mod movement;
mod reversal;

pub use movement::MovementDetector;
pub use reversal::ReversalDetector;

use thiserror::Error;

use crate::config::DetectionSettings;
use crate::{PriceSeries, Signal, SignalKind};

/// Arithmetic failure inside a detector.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DetectorError {
    #[error("{detector:?} detector divisor '{operand}' is zero")]
    ZeroDivisor {
        detector: SignalKind,
        operand: &'static str,
    },
}

/// Runs the detectors in priority order.
///
/// A movement wins outright; the reversal check only runs once the series
/// covers a full reversal window.
pub fn detect(
    series: &PriceSeries,
    settings: &DetectionSettings,
) -> Result<Option<Signal>, DetectorError> {
    if let Some(signal) = settings.movement().detect(series)? {
        return Ok(Some(signal));
    }
    if series.len() >= settings.reversal_window {
        return settings.reversal().detect(series);
    }
    Ok(None)
}

/// Percent distance `(to - from) / from * 100`, failing on a zero base.
fn percent_change(
    from: f64,
    to: f64,
    detector: SignalKind,
    operand: &'static str,
) -> Result<f64, DetectorError> {
    if from == 0.0 {
        return Err(DetectorError::ZeroDivisor { detector, operand });
    }
    Ok((to - from) / from * 100.0)
}
