mod instruments;
mod once;
mod run;
mod sources;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use ferrowatch_core::{
    InstrumentEvaluator, LogNotifier, Notifier, Scheduler, SourceRouter, TelegramCredentials,
    TelegramNotifier, WatchConfig,
};
use tracing::warn;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let config = Arc::new(load_config(cli.config.as_deref())?);

    match cli.command {
        Command::Run => run::run(build_scheduler(config, cli.dry_run)).await,
        Command::Once => once::run(&build_scheduler(config, cli.dry_run), cli.pretty).await,
        Command::Instruments => instruments::run(&config, cli.pretty),
        Command::Sources => sources::run(&build_router(&config), cli.pretty).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<WatchConfig, CliError> {
    let config = match path {
        Some(path) => WatchConfig::load(path)?,
        None => WatchConfig::default(),
    };
    Ok(config)
}

fn build_router(config: &WatchConfig) -> SourceRouter {
    SourceRouter::default().with_call_timeout(config.schedule.call_timeout())
}

fn build_notifier(dry_run: bool, credentials: Option<TelegramCredentials>) -> Arc<dyn Notifier> {
    match (dry_run, credentials) {
        (true, _) => Arc::new(LogNotifier),
        (false, Some(credentials)) => Arc::new(TelegramNotifier::new(credentials)),
        (false, None) => {
            warn!("telegram credentials are not set; alerts will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

fn build_scheduler(config: Arc<WatchConfig>, dry_run: bool) -> Scheduler {
    let router = Arc::new(build_router(&config));
    let notifier = build_notifier(dry_run, TelegramCredentials::from_env());
    Scheduler::new(InstrumentEvaluator::new(config, router), notifier)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_config_path_uses_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config, WatchConfig::default());
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[detection]\nmin_move_pct = 2.0").expect("write config");
        let config = load_config(Some(file.path())).expect("valid config");
        assert_eq!(config.detection.min_move_pct, 2.0);

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[schedule]\ninterval_secs = 0").expect("write config");
        let err = load_config(Some(file.path())).expect_err("must fail");
        assert_eq!(err.exit_code(), 2);
    }
}
