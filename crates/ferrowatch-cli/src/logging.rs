use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;
use crate::error::CliError;

const DEFAULT_FILTER: &str = "ferrowatch=info,ferrowatch_core=info,warn";

/// Installs the global subscriber. Logs go to stderr; stdout carries JSON output.
pub fn init(format: LogFormat) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| CliError::Logging(error.to_string()))
}
