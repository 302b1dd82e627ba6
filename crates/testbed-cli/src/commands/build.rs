//! `tb build`: Assemble a build from flags and prompts, then submit it.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use testbed_build::flags::BuildFlags;
use testbed_build::images::ImageAliasTable;
use testbed_build::pipeline::{self, Assembly, BuildContext};
use testbed_build::prompt::TerminalPrompter;
use testbed_client::{store, submit};
use testbed_common::config::CliConfig;
use testbed_common::constants;
use testbed_common::error::TestbedError;
use testbed_common::types::BuildConfiguration;

use super::{attach, previous, stop, Session};
use crate::output;

/// Arguments for the `build` command.
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct BuildArgs {
    /// Operation on an earlier build instead of a new one.
    #[command(subcommand)]
    pub action: Option<BuildAction>,

    /// Flags describing the new build.
    #[command(flatten)]
    pub flags: BuildFlagArgs,
}

/// Operations on the previous build.
#[derive(Subcommand, Debug)]
pub enum BuildAction {
    /// Rebuild using the previous build's configuration.
    #[command(visible_alias = "prev")]
    Previous(previous::PreviousArgs),
    /// Stop the current build.
    #[command(visible_aliases = ["halt", "cancel"])]
    Stop(stop::StopArgs),
    /// Follow a build that is in progress.
    #[command(visible_alias = "resume")]
    Attach(attach::AttachArgs),
}

/// Command-line flags of a new build.
#[derive(Args, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuildFlagArgs {
    /// Server IDs to build on.
    #[arg(short, long, value_delimiter = ',')]
    pub servers: Option<Vec<String>>,

    /// Blockchain to build.
    #[arg(short, long)]
    pub blockchain: Option<String>,

    /// Number of nodes.
    #[arg(short, long)]
    pub nodes: Option<usize>,

    /// CPU limit: a default and/or `index=value` per node.
    #[arg(short, long, value_delimiter = ',')]
    pub cpus: Option<Vec<String>>,

    /// Memory limit: a default and/or `index=value` per node.
    #[arg(short, long, value_delimiter = ',')]
    pub memory: Option<Vec<String>>,

    /// JSON file with the blockchain parameters.
    #[arg(short = 'f', long = "file")]
    pub params_file: Option<PathBuf>,

    /// Number of validators.
    #[arg(short, long)]
    pub validators: Option<usize>,

    /// Image: a default and/or `index=image` per node.
    #[arg(short, long = "image", value_delimiter = ',')]
    pub images: Option<Vec<String>>,

    /// Blockchain parameter as `name=value`.
    #[arg(short, long = "option", value_delimiter = ',')]
    pub options: Option<Vec<String>>,

    /// Environment variable as `KEY=value` or `index:KEY=value`.
    #[arg(short, long, value_delimiter = ',')]
    pub env: Option<Vec<String>>,

    /// File template as `dest;src` or `index;dest;src`.
    #[arg(short, long = "template", value_delimiter = ',')]
    pub templates: Option<Vec<String>>,

    /// Registry username for private images.
    #[arg(long)]
    pub docker_username: Option<String>,

    /// Registry password for private images.
    #[arg(long)]
    pub docker_password: Option<String>,

    /// Public key files to authorize on the nodes.
    #[arg(long = "user-ssh-key", value_delimiter = ',')]
    pub ssh_keys: Option<Vec<PathBuf>>,

    /// Pull images even if they are cached.
    #[arg(long)]
    pub force_docker_pull: bool,

    /// Take over a build that holds the lock.
    #[arg(long)]
    pub force_unlock: bool,

    /// Pause the build once infrastructure is up, before genesis.
    #[arg(long)]
    pub freeze_before_genesis: bool,

    /// Dockerfile to build the node image from.
    #[arg(long)]
    pub dockerfile: Option<PathBuf>,

    /// Port binding as `index=host:container`.
    #[arg(short = 'p', long = "expose-port-mapping", value_delimiter = ',')]
    pub port_mappings: Option<Vec<String>>,

    /// Git repository to build the node image from.
    #[arg(long)]
    pub git_repo: Option<String>,

    /// Branch of `--git-repo`.
    #[arg(long)]
    pub git_repo_branch: Option<String>,

    /// Container ports to expose linearly on every node.
    #[arg(long, value_delimiter = ',')]
    pub expose_all: Option<Vec<u16>>,

    /// Block number to start collecting logs at.
    #[arg(long)]
    pub start_logging_at_block: Option<i64>,

    /// Host CPUs to pin to each node.
    #[arg(long)]
    pub bound_cpus: Option<usize>,

    /// Use the default blockchain parameters without asking.
    #[arg(short, long)]
    pub yes: bool,

    /// Print the assembled build instead of submitting it.
    #[arg(long)]
    pub debug: bool,
}

impl From<BuildFlagArgs> for BuildFlags {
    fn from(args: BuildFlagArgs) -> Self {
        Self {
            servers: args.servers,
            blockchain: args.blockchain,
            nodes: args.nodes,
            cpus: args.cpus,
            memory: args.memory,
            params_file: args.params_file,
            validators: args.validators,
            images: args.images,
            options: args.options,
            env: args.env,
            templates: args.templates,
            docker_username: args.docker_username,
            docker_password: args.docker_password,
            ssh_keys: args.ssh_keys,
            force_docker_pull: args.force_docker_pull,
            force_unlock: args.force_unlock,
            freeze_before_genesis: args.freeze_before_genesis,
            dockerfile: args.dockerfile,
            port_mappings: args.port_mappings,
            git_repo: args.git_repo,
            git_repo_branch: args.git_repo_branch,
            expose_all: args.expose_all,
            start_logging_at_block: args.start_logging_at_block,
            bound_cpus: args.bound_cpus,
            yes: args.yes,
            debug: args.debug,
        }
    }
}

/// Executes the `build` command.
///
/// # Errors
///
/// Returns an error if assembly, submission or following the build fails.
pub fn execute(args: BuildArgs, config: &CliConfig) -> anyhow::Result<()> {
    let session = Session::open(config)?;
    match args.action {
        Some(BuildAction::Previous(a)) => previous::execute(&a, &session),
        Some(BuildAction::Stop(a)) => stop::execute(&a, &session),
        Some(BuildAction::Attach(a)) => attach::execute(&a, &session),
        None => {
            let images = ImageAliasTable::discover(config.image_table.as_deref())?;
            build(&args.flags.into(), &session, &images)
        }
    }
}

fn build(flags: &BuildFlags, session: &Session, images: &ImageAliasTable) -> anyhow::Result<()> {
    let previous = seed(session);
    let mut prompter = TerminalPrompter::new();
    let mut ctx = BuildContext {
        rpc: &session.rpc,
        images,
        prompter: &mut prompter,
    };

    match pipeline::assemble(flags, previous, &mut ctx)? {
        Assembly::Debug(doc) => {
            println!("{}", output::pretty_json(&doc)?);
            Ok(())
        }
        Assembly::Submit(doc) => submit_and_follow(session, &doc),
    }
}

/// Fetches the previous build to use as defaults. Any failure means a
/// fresh build.
fn seed(session: &Session) -> Option<BuildConfiguration> {
    match store::fetch_previous(&session.rpc, &session.store) {
        Ok((id, config)) => {
            tracing::debug!(build = %id, "using previous build as defaults");
            Some(config)
        }
        Err(TestbedError::MissingPrevious) => None,
        Err(e) => {
            tracing::warn!(error = %e, "could not fetch previous build, starting fresh");
            None
        }
    }
}

/// Submits `doc`, reports the new build and follows it.
pub(super) fn submit_and_follow(session: &Session, doc: &BuildConfiguration) -> anyhow::Result<()> {
    let cache = constants::smart_contract_cache();
    let id = submit::submit(&session.rpc, &session.store, doc, cache.as_deref())?;
    println!("Build started successfully: {id}");
    session.follow(&id)
}
