use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{ProviderId, ValidationError};

const MAX_INSTRUMENT_ID_LEN: usize = 24;

/// Display identifier of a monitored instrument, e.g. `XAU/USD` or `NAS100`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Parse and normalize an identifier to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyInstrumentId);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_INSTRUMENT_ID_LEN {
            return Err(ValidationError::InstrumentIdTooLong {
                len,
                max: MAX_INSTRUMENT_ID_LEN,
            });
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || matches!(ch, '/' | '.' | '-' | '_');
            if !valid {
                return Err(ValidationError::InstrumentIdInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    /// Builds an id from a literal already known to be valid.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InstrumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for InstrumentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for InstrumentId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<InstrumentId> for String {
    fn from(value: InstrumentId) -> Self {
        value.0
    }
}

/// A provider-specific symbol for one instrument, e.g. Yahoo `GC=F`.
///
/// Provider symbols are passed through verbatim (`^NDX`, `EURUSD=X`), so the
/// only check is that they are non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feed {
    pub source: ProviderId,
    pub symbol: String,
}

impl Feed {
    pub fn new(source: ProviderId, symbol: impl Into<String>) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyFeedSymbol);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::FeedSymbolWhitespace {
                value: trimmed.to_owned(),
            });
        }

        Ok(Self {
            source,
            symbol: trimmed.to_owned(),
        })
    }
}

impl Display for Feed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.symbol)
    }
}

/// How an instrument's price series is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstrumentKind {
    /// Fetched from a primary feed, falling back to a second feed.
    Direct {
        primary: Option<Feed>,
        fallback: Option<Feed>,
    },
    /// Derived as `numerator / denominator` from two direct instruments.
    Synthetic {
        numerator: InstrumentId,
        denominator: InstrumentId,
    },
}

/// Monitored instrument definition. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    #[serde(flatten)]
    pub kind: InstrumentKind,
}

impl Instrument {
    pub fn direct(
        id: InstrumentId,
        primary: Option<Feed>,
        fallback: Option<Feed>,
    ) -> Result<Self, ValidationError> {
        if primary.is_none() && fallback.is_none() {
            return Err(ValidationError::MissingFeed {
                instrument: id.to_string(),
            });
        }

        Ok(Self {
            id,
            kind: InstrumentKind::Direct { primary, fallback },
        })
    }

    pub fn synthetic(
        id: InstrumentId,
        numerator: InstrumentId,
        denominator: InstrumentId,
    ) -> Result<Self, ValidationError> {
        if numerator == denominator || numerator == id || denominator == id {
            return Err(ValidationError::InvalidSyntheticPair {
                instrument: id.to_string(),
            });
        }

        Ok(Self {
            id,
            kind: InstrumentKind::Synthetic {
                numerator,
                denominator,
            },
        })
    }

    pub const fn is_synthetic(&self) -> bool {
        matches!(self.kind, InstrumentKind::Synthetic { .. })
    }
}
