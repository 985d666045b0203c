use std::process::ExitCode;

use ferrowatch_core::WatchConfig;

use crate::error::CliError;
use crate::output;

pub fn run(config: &WatchConfig, pretty: bool) -> Result<ExitCode, CliError> {
    output::render(config, pretty)?;
    Ok(ExitCode::SUCCESS)
}
