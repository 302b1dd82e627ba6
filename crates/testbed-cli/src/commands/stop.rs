//! `tb build stop`: Stop the current build.

use clap::Args;
use testbed_client::api;

use super::Session;
use crate::output;

/// Arguments for the `build stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {}

/// Executes the `build stop` command.
///
/// # Errors
///
/// Returns an error if no previous build is stored or the service refuses
/// to stop it.
pub fn execute(_args: &StopArgs, session: &Session) -> anyhow::Result<()> {
    let id = session.store.load()?;
    tracing::info!(build = %id, "stopping build");
    let reply = api::stop_build(&session.rpc, &id)?;
    println!("{}", output::pretty_json(&reply)?);
    Ok(())
}
