use thiserror::Error;

/// Validation and contract errors exposed by `ferrowatch-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("instrument id cannot be empty")]
    EmptyInstrumentId,
    #[error("instrument id length {len} exceeds max {max}")]
    InstrumentIdTooLong { len: usize, max: usize },
    #[error("instrument id contains invalid character '{ch}' at index {index}")]
    InstrumentIdInvalidChar { ch: char, index: usize },

    #[error("feed symbol cannot be empty")]
    EmptyFeedSymbol,
    #[error("feed symbol contains whitespace: '{value}'")]
    FeedSymbolWhitespace { value: String },

    #[error("instrument '{instrument}' needs a primary or fallback feed")]
    MissingFeed { instrument: String },
    #[error("synthetic instrument '{instrument}' must reference two distinct other instruments")]
    InvalidSyntheticPair { instrument: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("reference price must be positive, got {value}")]
    NonPositivePrice { value: String },
}
