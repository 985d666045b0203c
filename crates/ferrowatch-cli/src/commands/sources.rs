use std::process::ExitCode;

use ferrowatch_core::{ProviderId, SourceRouter};
use serde::Serialize;

use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SourceStatus {
    id: ProviderId,
    status: &'static str,
    rate_available: bool,
}

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<SourceStatus>,
}

pub async fn run(router: &SourceRouter, pretty: bool) -> Result<ExitCode, CliError> {
    let mut sources = Vec::with_capacity(ProviderId::ALL.len());
    for id in ProviderId::ALL {
        if let Some(snapshot) = router.snapshot(id).await {
            sources.push(SourceStatus {
                id,
                status: snapshot.status_label(),
                rate_available: snapshot.health.rate_available,
            });
        }
    }

    output::render(&SourcesResponseData { sources }, pretty)?;
    Ok(ExitCode::SUCCESS)
}
