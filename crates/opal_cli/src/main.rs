mod cli;
mod config;
mod logging;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use opal_logging::opal_error;

use crate::cli::Cli;
use crate::config::{OpalConfig, DEFAULT_CONFIG_FILE};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.verbose, cli.log_file.as_deref());

    match try_main(cli) {
        Ok(Some(_)) => ExitCode::SUCCESS,
        Ok(None) => ExitCode::FAILURE,
        Err(err) => {
            opal_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<Option<PathBuf>> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = OpalConfig::load(&config_path)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(run::run(cli, config))
}
