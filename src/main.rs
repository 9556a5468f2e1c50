use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use waverun::cli::{Cli, Command};
use waverun::commands::{self, RunReport};
use waverun::config::WaverunConfig;
use waverun::error::RunnerError;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let config = WaverunConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Run(args) => {
            if let RunReport::LedgerCreated { path, rows } = commands::run(args, &config)? {
                info!(path = %path.display(), rows, "generated ledger");
            }
        }
        Command::Status { database, json } => commands::status(database, *json, &config)?,
        Command::Template => commands::template(),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Item failures are recorded, not surfaced; only setup problems get here.
    match dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<RunnerError>().is_some_and(RunnerError::is_setup) {
                error!("setup failed: {e:#}");
            } else {
                error!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
