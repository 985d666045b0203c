//! CLI argument definitions for ferrowatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Evaluate all instruments every interval until Ctrl-C |
//! | `once` | Run a single cycle and print its report |
//! | `instruments` | Print the resolved configuration and registry |
//! | `sources` | Print price source health |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | built-in | TOML file overriding thresholds, timings and registry |
//! | `--dry-run` | `false` | Log alerts instead of sending them |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-format` | `text` | Log line format on stderr (text, json) |
//!
//! # Examples
//!
//! ```bash
//! # Watch the default registry, sending alerts to Telegram
//! FERROWATCH_TELEGRAM_TOKEN=... FERROWATCH_TELEGRAM_CHAT_ID=... ferrowatch run
//!
//! # One cycle without sending anything
//! ferrowatch once --dry-run --pretty
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Price movement and reversal alerts for a fixed set of instruments.
#[derive(Debug, Parser)]
#[command(name = "ferrowatch", author, version, about)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log alerts instead of delivering them to Telegram.
    #[arg(long, global = true, default_value_t = false)]
    pub dry_run: bool,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log line format. Filtering follows `RUST_LOG`.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run evaluation cycles until interrupted.
    ///
    /// Each cycle evaluates every instrument, delivers alerts in registry
    /// order, then sleeps for the rest of the interval (at least the
    /// minimum sleep).
    Run,

    /// Run one cycle and print the cycle report as JSON.
    ///
    /// Exits with code 3 when an alert could not be delivered or an
    /// evaluation panicked.
    Once,

    /// Print the resolved configuration as JSON.
    Instruments,

    /// Print health of the registered price sources.
    Sources,
}
