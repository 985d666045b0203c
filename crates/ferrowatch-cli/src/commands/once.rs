use std::process::ExitCode;

use ferrowatch_core::Scheduler;

use crate::error::CliError;
use crate::output;

pub async fn run(scheduler: &Scheduler, pretty: bool) -> Result<ExitCode, CliError> {
    let report = scheduler.run_cycle().await;
    output::render(&report, pretty)?;

    if !report.delivery_failures.is_empty() || report.count("panicked") > 0 {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}
