mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;

use clap::Parser;
use cli::Cli;
use skillsmp_core::paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive for the log file.
const LOG_FILTER_ENV: &str = "SKILLSMP_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let format = cli.output_format();
    let config = config::CliConfig::load();

    let guard = init_logging(cli.verbose);
    let result = commands::run(cli, config).await;
    drop(guard);

    if let Err(err) = result {
        error::handle_error(err, format);
    }
}

/// Log to `<data_dir>/logs/skillsmp.log`; terminal output stays reserved for
/// command results. Logging is skipped when the directory is unusable.
fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let log_dir = paths::logs_dir().ok()?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "skillsmp.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    Some(guard)
}
