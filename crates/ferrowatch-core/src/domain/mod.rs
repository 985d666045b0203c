//! # Domain Models
//!
//! Canonical domain types for ferrowatch.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Instrument`] | Monitored instrument and how its series is sourced |
//! | [`InstrumentId`] | Validated display identifier (`XAU/USD`) |
//! | [`Feed`] | Provider + provider-specific symbol |
//! | [`PriceSeries`] | Close prices, oldest first |
//! | [`Signal`] | Classified movement or reversal event |
//! | [`Alert`] | Signal with levels, ready for delivery |
//! | [`Levels`] | Entry / stop-loss / take-profit |
//! | [`Interval`] | Sampling cadence (hourly by default) |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Construction validates invariants and returns [`ValidationError`](crate::ValidationError)
//! on bad input; nothing in this module performs I/O.

mod alert;
mod instrument;
mod interval;
mod levels;
mod series;
mod signal;
mod timestamp;

pub use alert::Alert;
pub use instrument::{Feed, Instrument, InstrumentId, InstrumentKind};
pub use interval::Interval;
pub use levels::{round_price, Levels};
pub use series::PriceSeries;
pub use signal::{Direction, Signal, SignalKind};
pub use timestamp::UtcDateTime;
