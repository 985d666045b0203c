//! Cross-rate construction for synthetic instruments.

use crate::data_source::SourceError;
use crate::PriceSeries;

/// Builds `numerator[i] / denominator[i]` for two index-aligned series.
///
/// Both inputs must hold at least `min_samples` closes and have the same
/// length; no timestamp reconciliation is attempted. A zero denominator
/// sample makes the whole cross unavailable rather than producing an
/// infinite close.
pub fn ratio_series(
    numerator: &PriceSeries,
    denominator: &PriceSeries,
    min_samples: usize,
) -> Result<PriceSeries, SourceError> {
    if numerator.len() < min_samples || denominator.len() < min_samples {
        return Err(SourceError::unavailable(format!(
            "synthetic legs too short: {} and {} samples, need {min_samples}",
            numerator.len(),
            denominator.len()
        )));
    }

    if numerator.len() != denominator.len() {
        return Err(SourceError::unavailable(format!(
            "synthetic legs are misaligned: {} vs {} samples",
            numerator.len(),
            denominator.len()
        )));
    }

    if let Some(index) = denominator.closes().iter().position(|close| *close == 0.0) {
        return Err(SourceError::unavailable(format!(
            "synthetic denominator is zero at sample {index}"
        )));
    }

    let ratios = numerator
        .closes()
        .iter()
        .zip(denominator.closes())
        .map(|(top, bottom)| top / bottom)
        .collect();

    PriceSeries::new(ratios).map_err(|e| SourceError::internal(e.to_string()))
}
