use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Close prices for one instrument, oldest first.
///
/// Samples are implicitly evenly spaced at the requested interval; gap
/// handling is left to the source that produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Builds a series, rejecting NaN and infinite closes.
    pub fn new(closes: Vec<f64>) -> Result<Self, ValidationError> {
        if closes.iter().any(|close| !close.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "close" });
        }
        Ok(Self { closes })
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// The most recent `count` samples, or the whole series when shorter.
    pub fn tail(&self, count: usize) -> &[f64] {
        let start = self.closes.len().saturating_sub(count);
        &self.closes[start..]
    }

    /// Keeps only the most recent `count` samples.
    pub fn truncate_front(mut self, count: usize) -> Self {
        let start = self.closes.len().saturating_sub(count);
        self.closes.drain(..start);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_closes() {
        let err = PriceSeries::new(vec![1.0, f64::NAN]).expect_err("must fail");
        assert_eq!(err, ValidationError::NonFiniteValue { field: "close" });
    }

    #[test]
    fn tail_is_clamped_to_series_length() {
        let series = PriceSeries::new(vec![1.0, 2.0, 3.0]).expect("valid series");
        assert_eq!(series.tail(2), &[2.0, 3.0]);
        assert_eq!(series.tail(10), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn truncate_front_keeps_most_recent() {
        let series = PriceSeries::new(vec![1.0, 2.0, 3.0, 4.0]).expect("valid series");
        assert_eq!(series.truncate_front(2).closes(), &[3.0, 4.0]);
    }
}
