//! `tb build previous`: Resubmit the previous build unchanged.

use clap::Args;
use testbed_build::prompt::{self, TerminalPrompter};
use testbed_client::store;

use super::Session;
use super::build::submit_and_follow;
use crate::output;

/// Arguments for the `build previous` command.
#[derive(Args, Debug)]
pub struct PreviousArgs {
    /// Rebuild without asking for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

/// Executes the `build previous` command.
///
/// # Errors
///
/// Returns an error if no previous build is stored, it cannot be fetched,
/// or resubmitting it fails.
pub fn execute(args: &PreviousArgs, session: &Session) -> anyhow::Result<()> {
    let (id, config) = store::fetch_previous(&session.rpc, &session.store)?;
    tracing::debug!(build = %id, "fetched previous build");
    println!("{}", output::pretty_json(&config)?);

    if !args.yes && !prompt::confirm(&mut TerminalPrompter::new(), "Build from previous?")? {
        return Ok(());
    }
    println!("building from previous configuration");
    submit_and_follow(session, &config)
}
