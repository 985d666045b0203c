use serde::{Deserialize, Serialize};

use crate::{Direction, ValidationError};

const LONG_STOP: f64 = 0.993;
const LONG_TARGET: f64 = 1.016;
const SHORT_STOP: f64 = 1.007;
const SHORT_TARGET: f64 = 0.984;
const PRICE_SCALE: f64 = 1_000_000.0;

/// Entry, stop-loss and take-profit prices for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Levels {
    /// Derives levels from a reference price using fixed percentage offsets:
    /// stop 0.7% against the direction, target 1.6% with it.
    pub fn derive(reference: f64, direction: Direction) -> Result<Self, ValidationError> {
        if !reference.is_finite() || reference <= 0.0 {
            return Err(ValidationError::NonPositivePrice {
                value: reference.to_string(),
            });
        }

        let (stop_factor, target_factor) = match direction {
            Direction::Up => (LONG_STOP, LONG_TARGET),
            Direction::Down => (SHORT_STOP, SHORT_TARGET),
        };

        Ok(Self {
            entry: round_price(reference),
            stop_loss: round_price(reference * stop_factor),
            take_profit: round_price(reference * target_factor),
        })
    }
}

/// Rounds to six fractional digits.
pub fn round_price(value: f64) -> f64 {
    (value * PRICE_SCALE).round() / PRICE_SCALE
}
