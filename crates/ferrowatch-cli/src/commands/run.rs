use std::process::ExitCode;

use ferrowatch_core::Scheduler;
use tracing::info;

use crate::error::CliError;

pub async fn run(scheduler: Scheduler) -> Result<ExitCode, CliError> {
    info!(version = env!("CARGO_PKG_VERSION"), "ferrowatch started");
    let cycles = scheduler.run().await;
    info!(cycles, "ferrowatch stopped");
    Ok(ExitCode::SUCCESS)
}
