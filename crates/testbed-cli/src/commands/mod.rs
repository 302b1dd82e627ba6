//! CLI command definitions and dispatch.

pub mod attach;
pub mod build;
pub mod previous;
pub mod stop;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::{Parser, Subcommand};
use testbed_client::client::HttpRpcClient;
use testbed_client::listener::{BuildListener, ListenOutcome};
use testbed_client::store::PreviousBuildStore;
use testbed_common::config::CliConfig;
use testbed_common::types::BuildId;

use crate::output;

/// tb: Build and follow blockchain testnets.
#[derive(Parser, Debug)]
#[command(name = testbed_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Extra YAML configuration file, read after the system and user files.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a blockchain and deploy its nodes.
    #[command(visible_aliases = ["init", "create"])]
    Build(build::BuildArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli, config: &CliConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Build(args) => build::execute(args, config),
    }
}

/// Service connection and local state shared by the build commands.
#[derive(Debug)]
pub struct Session {
    /// JSON-RPC connection to the service.
    pub rpc: HttpRpcClient,
    /// Store of the last submitted build.
    pub store: PreviousBuildStore,
    poll_interval: Duration,
}

impl Session {
    /// Connects to the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn open(config: &CliConfig) -> anyhow::Result<Self> {
        Ok(Self {
            rpc: HttpRpcClient::new(config)?,
            store: PreviousBuildStore::new(&config.data_dir()),
            poll_interval: config.poll_interval(),
        })
    }

    /// Follows `id` until it finishes, freezes or the user presses Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns an error if polling fails or the build reports an error.
    pub fn follow(&self, id: &BuildId) -> anyhow::Result<()> {
        let listener = BuildListener::new(&self.rpc, self.poll_interval);
        let running = listener.running_flag();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

        eprintln!("  Following build {id}. Press Ctrl+C to detach.");
        let outcome = listener.listen(id, |status| {
            eprintln!("  {}", output::format_progress(status));
        })?;

        match outcome {
            ListenOutcome::Completed => eprintln!("  Build {id} completed."),
            ListenOutcome::Frozen => {
                eprintln!("  Build {id} is frozen before genesis.");
            }
            ListenOutcome::Interrupted => {
                eprintln!("  Detached. Use `tb build attach` to follow it again.");
            }
        }
        Ok(())
    }
}
