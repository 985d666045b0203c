use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Expected direction of the next price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detector that produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Movement,
    Reversal,
}

impl SignalKind {
    /// Tag shown in outbound messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Movement => "ALERT",
            Self::Reversal => "ANTICIPATED",
        }
    }
}

impl Display for SignalKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified price event for one instrument in one cycle.
///
/// Reversal signals carry no percent change: the proximity distance is not
/// a move and is never reported as one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    Movement {
        direction: Direction,
        reference_price: f64,
        percent_change: f64,
    },
    Reversal {
        direction: Direction,
        reference_price: f64,
    },
}

impl Signal {
    pub const fn kind(&self) -> SignalKind {
        match self {
            Self::Movement { .. } => SignalKind::Movement,
            Self::Reversal { .. } => SignalKind::Reversal,
        }
    }

    pub const fn direction(&self) -> Direction {
        match self {
            Self::Movement { direction, .. } | Self::Reversal { direction, .. } => *direction,
        }
    }

    pub const fn reference_price(&self) -> f64 {
        match self {
            Self::Movement {
                reference_price, ..
            }
            | Self::Reversal {
                reference_price, ..
            } => *reference_price,
        }
    }

    pub const fn percent_change(&self) -> Option<f64> {
        match self {
            Self::Movement { percent_change, .. } => Some(*percent_change),
            Self::Reversal { .. } => None,
        }
    }
}
