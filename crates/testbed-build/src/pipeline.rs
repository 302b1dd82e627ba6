//! Assembles one [`BuildConfiguration`] from flags, an optional previous
//! build and interactive answers.
//!
//! Order matters: prompts fill in blockchain and node count, parameters
//! are typed against the service schema, the node count is finalized, and
//! only then do the per-node handlers run. Nothing here calls `build`.

use testbed_client::api;
use testbed_client::client::RpcClient;
use testbed_common::error::Result;
use testbed_common::types::BuildConfiguration;

use crate::flags::BuildFlags;
use crate::handlers::{self, extras, nodes, params, ports, resources, servers};
use crate::images::ImageAliasTable;
use crate::prompt::{self, Prompter};

/// Collaborators the pipeline needs besides the flags.
pub struct BuildContext<'a> {
    /// Service connection for server discovery and parameter schemas.
    pub rpc: &'a dyn RpcClient,
    /// Image alias lookup.
    pub images: &'a ImageAliasTable,
    /// Source of interactive answers.
    pub prompter: &'a mut dyn Prompter,
}

/// What to do with an assembled document.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    /// Send it to the service.
    Submit(BuildConfiguration),
    /// Print it and stop; `--debug` was given.
    Debug(BuildConfiguration),
}

impl Assembly {
    /// The assembled document.
    pub const fn config(&self) -> &BuildConfiguration {
        match self {
            Self::Submit(config) | Self::Debug(config) => config,
        }
    }
}

/// Runs every handler and returns a validated document.
///
/// `previous` seeds the document through
/// [`BuildConfiguration::into_seed`]; absent flags never overwrite what it
/// provides.
///
/// # Errors
///
/// Returns the first input, I/O, prompt or RPC error. No `build` call is
/// made in any case.
pub fn assemble(
    flags: &BuildFlags,
    previous: Option<BuildConfiguration>,
    ctx: &mut BuildContext<'_>,
) -> Result<Assembly> {
    let mut config = previous.map(BuildConfiguration::into_seed).unwrap_or_default();

    let plan = prompt::plan_prompts(flags, &config);
    let answers = prompt::ask_all(ctx.prompter, &plan)?;

    if let Some(blockchain) = flags.blockchain.as_ref().or(answers.blockchain.as_ref()) {
        config.blockchain.clone_from(blockchain);
    }
    config.blockchain = config.blockchain.to_lowercase();
    if let Some(count) = flags.nodes.or(answers.node_count()?) {
        config.nodes = count;
    }
    tracing::debug!(blockchain = %config.blockchain, nodes = config.nodes, "base settings");

    servers::apply(flags.servers.as_deref(), &mut config, ctx.rpc)?;
    apply_params(flags, &mut config, ctx)?;

    let mut sized = handlers::finalize_nodes(&mut config, flags.validators)?;

    let given = resources::apply(&mut sized, flags.cpus.as_deref(), flags.memory.as_deref())?;
    resources::apply_uniform(
        &mut sized,
        answers.cpus.as_deref().filter(|_| !given.cpus),
        answers.memory.as_deref().filter(|_| !given.memory),
    );
    nodes::apply_images(&mut sized, flags.images.as_deref(), ctx.images)?;
    nodes::apply_env(&mut sized, flags.env.as_deref())?;
    nodes::apply_templates(&mut sized, flags.templates.as_deref())?;
    ports::apply_port_mappings(&mut sized, flags.port_mappings.as_deref())?;
    ports::apply_expose_all(&mut sized, flags.expose_all.as_deref(), 0)?;
    resources::apply_bound_cpus(&mut sized, flags.bound_cpus)?;
    extras::apply(flags, sized.document())?;

    config.fit_to_nodes();
    config.validate()?;

    if flags.debug {
        return Ok(Assembly::Debug(config));
    }
    Ok(Assembly::Submit(config))
}

/// Parameters come from `--file`, else `--option`, else the interactive
/// prompt unless the user keeps the defaults.
fn apply_params(
    flags: &BuildFlags,
    config: &mut BuildConfiguration,
    ctx: &mut BuildContext<'_>,
) -> Result<()> {
    if let Some(path) = &flags.params_file {
        return params::apply_file(path, config);
    }
    if let Some(options) = &flags.options {
        let schema = api::get_params(ctx.rpc, &config.blockchain)?;
        return params::apply_options(options, &schema, config);
    }
    if flags.yes || prompt::confirm(ctx.prompter, "Use default parameters?")? {
        return Ok(());
    }
    let schema = api::get_params(ctx.rpc, &config.blockchain)?;
    params::prompt_params(ctx.prompter, &schema, config)
}
