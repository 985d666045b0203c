use super::{percent_change, DetectorError};
use crate::{Direction, PriceSeries, Signal, SignalKind};

/// Strong directional move over a fixed lookback.
///
/// Compares the last close with the close `lookback` samples from the end
/// (`series[-lookback]`), so the cost is constant regardless of history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementDetector {
    pub lookback: usize,
    pub min_move_pct: f64,
}

impl Default for MovementDetector {
    fn default() -> Self {
        Self {
            lookback: 5,
            min_move_pct: 1.0,
        }
    }
}

impl MovementDetector {
    pub fn new(lookback: usize, min_move_pct: f64) -> Self {
        Self {
            lookback,
            min_move_pct,
        }
    }

    pub fn detect(&self, series: &PriceSeries) -> Result<Option<Signal>, DetectorError> {
        let closes = series.closes();
        if self.lookback == 0 || closes.len() < self.lookback {
            return Ok(None);
        }

        let last = closes[closes.len() - 1];
        let prev = closes[closes.len() - self.lookback];
        let pct = percent_change(prev, last, SignalKind::Movement, "prev")?;

        if pct.abs() < self.min_move_pct {
            return Ok(None);
        }

        let direction = if pct > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        };

        Ok(Some(Signal::Movement {
            direction,
            reference_price: last,
            percent_change: pct,
        }))
    }
}
