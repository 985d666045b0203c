use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Duration;

/// Sampling cadence requested from a price source.
///
/// Detection thresholds are tuned for hourly closes, so that is the only
/// cadence the engine requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    OneHour,
}

impl Interval {
    /// Provider query value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::OneHour => Duration::hours(1),
        }
    }

    /// Whole days needed to cover `samples` consecutive samples, at least one.
    pub fn days_spanned(self, samples: usize) -> i64 {
        let samples = i64::try_from(samples).unwrap_or(i64::MAX);
        let total_seconds = self.duration().whole_seconds().saturating_mul(samples);
        let day = Duration::days(1).whole_seconds();
        ((total_seconds + day - 1) / day).max(1)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
