//! Watch configuration: instrument registry, detector thresholds, timings.
//!
//! A [`WatchConfig`] is built once at startup (defaults, optionally
//! overridden by a TOML file) and shared read-only afterwards.
//!
//! ```toml
//! [detection]
//! min_move_pct = 1.5
//!
//! [schedule]
//! interval_secs = 600
//!
//! [[instruments]]
//! id = "XAU/USD"
//! kind = "direct"
//! primary = { source = "yahoo", symbol = "GC=F" }
//!
//! [[instruments]]
//! id = "XAU/EUR"
//! kind = "synthetic"
//! numerator = "XAU/USD"
//! denominator = "EUR/USD"
//! ```

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::{MovementDetector, ReversalDetector};
use crate::{Feed, Instrument, InstrumentId, InstrumentKind, ProviderId, ValidationError};

const TOKEN_VARS: [&str; 2] = ["FERROWATCH_TELEGRAM_TOKEN", "TELEGRAM_BOT_TOKEN"];
const CHAT_ID_VARS: [&str; 2] = ["FERROWATCH_TELEGRAM_CHAT_ID", "TELEGRAM_CHAT_ID"];

/// Errors raised while loading or validating a [`WatchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("instrument registry is empty")]
    EmptyRegistry,
    #[error("instrument '{0}' is defined more than once")]
    DuplicateInstrument(InstrumentId),
    #[error("synthetic instrument '{instrument}' references unknown instrument '{leg}'")]
    UnknownLeg {
        instrument: InstrumentId,
        leg: InstrumentId,
    },
    #[error("synthetic instrument '{instrument}' references synthetic instrument '{leg}'")]
    NestedSynthetic {
        instrument: InstrumentId,
        leg: InstrumentId,
    },

    #[error("'{field}' must be positive")]
    NonPositive { field: &'static str },
    #[error("lookback must be at least 2, got {0}")]
    LookbackTooShort(usize),
    #[error("reversal_window ({window}) must not be smaller than min_samples ({min_samples})")]
    WindowBelowMinSamples { window: usize, min_samples: usize },
}

/// Detector thresholds and window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectionSettings {
    pub min_move_pct: f64,
    pub anticipate_pct: f64,
    pub lookback: usize,
    pub reversal_window: usize,
    pub min_samples: usize,
    /// Closes requested per fetch.
    pub fetch_samples: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            min_move_pct: 1.0,
            anticipate_pct: 0.3,
            lookback: 5,
            reversal_window: 24,
            min_samples: 5,
            fetch_samples: 48,
        }
    }
}

impl DetectionSettings {
    pub fn movement(&self) -> MovementDetector {
        MovementDetector::new(self.lookback, self.min_move_pct)
    }

    pub fn reversal(&self) -> ReversalDetector {
        ReversalDetector::new(self.reversal_window, self.min_samples, self.anticipate_pct)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_move_pct.is_finite() && self.min_move_pct > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "min_move_pct",
            });
        }
        if !(self.anticipate_pct.is_finite() && self.anticipate_pct > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "anticipate_pct",
            });
        }
        if self.min_samples == 0 {
            return Err(ConfigError::NonPositive {
                field: "min_samples",
            });
        }
        if self.fetch_samples == 0 {
            return Err(ConfigError::NonPositive {
                field: "fetch_samples",
            });
        }
        if self.lookback < 2 {
            return Err(ConfigError::LookbackTooShort(self.lookback));
        }
        if self.reversal_window < self.min_samples {
            return Err(ConfigError::WindowBelowMinSamples {
                window: self.reversal_window,
                min_samples: self.min_samples,
            });
        }
        Ok(())
    }
}

/// Cycle timings, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSettings {
    pub interval_secs: u64,
    pub min_sleep_secs: u64,
    pub call_timeout_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            min_sleep_secs: 5,
            call_timeout_secs: 10,
        }
    }
}

impl ScheduleSettings {
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn min_sleep(&self) -> Duration {
        Duration::from_secs(self.min_sleep_secs)
    }

    /// Upper bound for any single fetch or delivery.
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::NonPositive {
                field: "interval_secs",
            });
        }
        if self.call_timeout_secs == 0 {
            return Err(ConfigError::NonPositive {
                field: "call_timeout_secs",
            });
        }
        Ok(())
    }
}

/// Immutable runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchConfig {
    pub detection: DetectionSettings,
    pub schedule: ScheduleSettings,
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    detection: DetectionSettings,
    #[serde(default)]
    schedule: ScheduleSettings,
    instruments: Option<Vec<Instrument>>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            detection: DetectionSettings::default(),
            schedule: ScheduleSettings::default(),
            instruments: default_registry(),
        }
    }
}

impl WatchConfig {
    /// Validates and wraps an explicit registry.
    pub fn new(
        detection: DetectionSettings,
        schedule: ScheduleSettings,
        instruments: Vec<Instrument>,
    ) -> Result<Self, ConfigError> {
        let instruments = instruments
            .into_iter()
            .map(normalize_feeds)
            .collect::<Result<Vec<_>, _>>()?;
        let config = Self {
            detection,
            schedule,
            instruments,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML; omitted sections and an omitted registry keep defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(input)?;
        Self::new(
            file.detection,
            file.schedule,
            file.instruments.unwrap_or_else(default_registry),
        )
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn instrument(&self, id: &InstrumentId) -> Option<&Instrument> {
        self.instruments.iter().find(|instrument| &instrument.id == id)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;
        self.schedule.validate()?;

        if self.instruments.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }

        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if !seen.insert(&instrument.id) {
                return Err(ConfigError::DuplicateInstrument(instrument.id.clone()));
            }
        }

        for instrument in &self.instruments {
            match &instrument.kind {
                InstrumentKind::Direct { primary, fallback } => {
                    Instrument::direct(instrument.id.clone(), primary.clone(), fallback.clone())?;
                }
                InstrumentKind::Synthetic {
                    numerator,
                    denominator,
                } => {
                    Instrument::synthetic(
                        instrument.id.clone(),
                        numerator.clone(),
                        denominator.clone(),
                    )?;
                    for leg in [numerator, denominator] {
                        match self.instrument(leg) {
                            None => {
                                return Err(ConfigError::UnknownLeg {
                                    instrument: instrument.id.clone(),
                                    leg: leg.clone(),
                                })
                            }
                            Some(target) if target.is_synthetic() => {
                                return Err(ConfigError::NestedSynthetic {
                                    instrument: instrument.id.clone(),
                                    leg: leg.clone(),
                                })
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Rebuilds deserialized feeds through [`Feed::new`] so stored symbols are trimmed.
fn normalize_feeds(instrument: Instrument) -> Result<Instrument, ValidationError> {
    let Instrument { id, kind } = instrument;
    match kind {
        InstrumentKind::Direct { primary, fallback } => {
            let normalize =
                |feed: Option<Feed>| feed.map(|feed| Feed::new(feed.source, feed.symbol)).transpose();
            Ok(Instrument {
                id,
                kind: InstrumentKind::Direct {
                    primary: normalize(primary)?,
                    fallback: normalize(fallback)?,
                },
            })
        }
        kind => Ok(Instrument { id, kind }),
    }
}

/// Telegram bot credentials. `Debug` never shows the token.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

impl Debug for TelegramCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramCredentials {
    /// Reads credentials from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through `lookup`, first non-blank variable wins.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .map(|value| value.trim().to_owned())
                .find(|value| !value.is_empty())
        };

        Some(Self {
            token: first(&TOKEN_VARS)?,
            chat_id: first(&CHAT_ID_VARS)?,
        })
    }
}

fn direct(id: &'static str, source: ProviderId, symbol: &str) -> Instrument {
    Instrument {
        id: InstrumentId::from_static(id),
        kind: InstrumentKind::Direct {
            primary: Some(Feed {
                source,
                symbol: symbol.to_owned(),
            }),
            fallback: None,
        },
    }
}

/// Built-in registry monitored when no file overrides it.
pub fn default_registry() -> Vec<Instrument> {
    vec![
        direct("XAU/USD", ProviderId::Yahoo, "GC=F"),
        Instrument {
            id: InstrumentId::from_static("XAU/EUR"),
            kind: InstrumentKind::Synthetic {
                numerator: InstrumentId::from_static("XAU/USD"),
                denominator: InstrumentId::from_static("EUR/USD"),
            },
        },
        direct("GBP/JPY", ProviderId::Yahoo, "GBPJPY=X"),
        direct("EUR/USD", ProviderId::Yahoo, "EURUSD=X"),
        direct("UKOIL", ProviderId::Yahoo, "BZ=F"),
        direct("NAS100", ProviderId::Yahoo, "^NDX"),
        direct("BTC/USDT", ProviderId::Binance, "BTCUSDT"),
        direct("ETH/USDT", ProviderId::Binance, "ETHUSDT"),
        direct("GBP/USD", ProviderId::Yahoo, "GBPUSD=X"),
    ]
}
