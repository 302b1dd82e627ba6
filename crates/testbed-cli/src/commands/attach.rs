//! `tb build attach`: Follow the build in progress.

use clap::Args;

use super::Session;

/// Arguments for the `build attach` command.
#[derive(Args, Debug)]
pub struct AttachArgs {}

/// Executes the `build attach` command.
///
/// # Errors
///
/// Returns an error if no previous build is stored, before any call to the
/// service, or if following it fails.
pub fn execute(_args: &AttachArgs, session: &Session) -> anyhow::Result<()> {
    let id = session.store.load()?;
    session.follow(&id)
}
