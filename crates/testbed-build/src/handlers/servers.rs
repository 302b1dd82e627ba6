//! Target server selection.

use testbed_client::api;
use testbed_client::client::RpcClient;
use testbed_common::error::{Result, TestbedError};
use testbed_common::types::BuildConfiguration;

use crate::normalize;

/// Sets [`BuildConfiguration::servers`].
///
/// Given IDs replace any inherited list. Without the flag and without an
/// inherited list, the first server the service reports is used; only one
/// server is ever picked automatically.
///
/// # Errors
///
/// Returns [`TestbedError::InvalidInteger`] for a non-integer ID, or an RPC
/// error if discovery fails or finds no server.
pub fn apply(
    servers: Option<&[String]>,
    config: &mut BuildConfiguration,
    rpc: &dyn RpcClient,
) -> Result<()> {
    if let Some(raw) = servers {
        config.servers = raw
            .iter()
            .map(|s| normalize::parse_decimal("servers", s))
            .collect::<Result<_>>()?;
        return Ok(());
    }
    if !config.servers.is_empty() {
        return Ok(());
    }

    let first = api::get_servers(rpc)?
        .into_iter()
        .next()
        .ok_or_else(|| TestbedError::rpc("get_servers", "no servers available"))?;
    tracing::info!(server = %first.name, id = first.id, "selected server");
    config.servers = vec![first.id];
    Ok(())
}
