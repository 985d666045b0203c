use super::{percent_change, DetectorError};
use crate::{Direction, PriceSeries, Signal, SignalKind};

/// Proximity of the last close to the rolling high or low.
///
/// A close within `anticipate_pct` of the window high anticipates a pullback
/// (Down); within `anticipate_pct` of the low, a bounce (Up). The high is
/// checked first, so a flat window resolves to Down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversalDetector {
    pub window: usize,
    pub min_samples: usize,
    pub anticipate_pct: f64,
}

impl Default for ReversalDetector {
    fn default() -> Self {
        Self {
            window: 24,
            min_samples: 5,
            anticipate_pct: 0.3,
        }
    }
}

impl ReversalDetector {
    pub fn new(window: usize, min_samples: usize, anticipate_pct: f64) -> Self {
        Self {
            window,
            min_samples,
            anticipate_pct,
        }
    }

    pub fn detect(&self, series: &PriceSeries) -> Result<Option<Signal>, DetectorError> {
        let window = series.tail(self.window);
        let Some(&last) = window.last() else {
            return Ok(None);
        };
        if window.len() < self.min_samples.max(1) {
            return Ok(None);
        }

        let high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = window.iter().copied().fold(f64::INFINITY, f64::min);

        // (high - last) / high == -percent_change(high, last)
        let pct_to_high = -percent_change(high, last, SignalKind::Reversal, "high")?;
        let pct_to_low = percent_change(low, last, SignalKind::Reversal, "low")?;

        let direction = if pct_to_high <= self.anticipate_pct {
            Direction::Down
        } else if pct_to_low <= self.anticipate_pct {
            Direction::Up
        } else {
            return Ok(None);
        };

        Ok(Some(Signal::Reversal {
            direction,
            reference_price: last,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new(closes.to_vec()).expect("valid series")
    }

    fn window_with_last(last: f64) -> Vec<f64> {
        let mut closes = vec![47.0; 24];
        closes[3] = 50.0;
        closes[10] = 45.0;
        closes[23] = last;
        closes
    }

    #[test]
    fn near_high_anticipates_pullback() {
        let signal = ReversalDetector::default()
            .detect(&series(&window_with_last(49.9)))
            .expect("no arithmetic error")
            .expect("0.2% from high must trigger");

        assert_eq!(
            signal,
            Signal::Reversal {
                direction: Direction::Down,
                reference_price: 49.9,
            }
        );
        assert_eq!(signal.percent_change(), None);
    }

    #[test]
    fn near_low_anticipates_bounce() {
        let signal = ReversalDetector::default()
            .detect(&series(&window_with_last(45.1)))
            .expect("no arithmetic error")
            .expect("0.22% from low must trigger");

        assert_eq!(signal.direction(), Direction::Up);
    }

    #[test]
    fn mid_range_is_no_signal() {
        let result = ReversalDetector::default().detect(&series(&window_with_last(47.5)));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn flat_window_resolves_down() {
        let signal = ReversalDetector::default()
            .detect(&series(&[10.0; 24]))
            .expect("no arithmetic error")
            .expect("flat window touches both extremes");

        assert_eq!(signal.direction(), Direction::Down);
    }

    #[test]
    fn only_the_last_window_counts() {
        // An old spike to 80 falls outside the 24-sample window.
        let mut closes = vec![80.0];
        closes.extend(window_with_last(49.9));

        let signal = ReversalDetector::default()
            .detect(&series(&closes))
            .expect("no arithmetic error")
            .expect("window high is 50");
        assert_eq!(signal.direction(), Direction::Down);
    }

    #[test]
    fn too_few_samples_is_no_signal() {
        let result = ReversalDetector::default().detect(&series(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn zero_low_is_distinct_error() {
        let err = ReversalDetector::default()
            .detect(&series(&[5.0, 0.0, 4.0, 4.5, 3.0]))
            .expect_err("zero low must fail");

        assert_eq!(
            err,
            DetectorError::ZeroDivisor {
                detector: SignalKind::Reversal,
                operand: "low",
            }
        );
    }
}
