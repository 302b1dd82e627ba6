//! Build submission: send the document, persist its ID, drop stale artifacts.

use std::path::Path;

use testbed_common::error::{Result, TestbedError};
use testbed_common::types::{BuildConfiguration, BuildId};

use crate::api;
use crate::client::RpcClient;
use crate::store::PreviousBuildStore;

/// Submits `config` and records the returned identifier in `store`.
///
/// Once the service has accepted the build, the cached smart-contract
/// artifact at `artifact_cache` is removed even if persisting the
/// identifier fails. A failed `build` call leaves both untouched.
///
/// # Errors
///
/// Returns the `build` RPC error, or the first error from persisting the
/// identifier or removing the artifact.
pub fn submit(
    rpc: &dyn RpcClient,
    store: &PreviousBuildStore,
    config: &BuildConfiguration,
    artifact_cache: Option<&Path>,
) -> Result<BuildId> {
    tracing::info!(blockchain = %config.blockchain, nodes = config.nodes, "submitting build");
    let id = api::build(rpc, config)?;

    let persisted = store.save(&id);
    let cleaned = artifact_cache.map_or(Ok(()), remove_cached_artifact);
    persisted?;
    cleaned?;

    tracing::info!(build = %id, "build accepted");
    Ok(id)
}

/// Removes a cached artifact file; a missing file is not an error.
///
/// # Errors
///
/// Returns [`TestbedError::Io`] if the file exists but cannot be removed.
pub fn remove_cached_artifact(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed cached smart contracts");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TestbedError::io(path, e)),
    }
}
