//! # tb: testbed CLI
//!
//! Assembles blockchain testnet builds and submits them to the testbed
//! orchestration service, then follows their progress.

mod commands;
mod output;

use clap::Parser;
use testbed_common::config::CliConfig;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.verbosity));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(api_url = %config.api_url, "loaded configuration");
    commands::execute(cli, &config)
}
