//! Single-slot store for the last submitted build identifier.
//!
//! The identifier is kept as raw bytes in one file. An absent or empty file
//! means there is no previous build.

use std::path::{Path, PathBuf};

use testbed_common::constants::PREVIOUS_BUILD_FILE;
use testbed_common::error::{Result, TestbedError};
use testbed_common::types::{BuildConfiguration, BuildId};

use crate::api;
use crate::client::RpcClient;

/// File-backed store of the previous build identifier.
#[derive(Debug, Clone)]
pub struct PreviousBuildStore {
    path: PathBuf,
}

impl PreviousBuildStore {
    /// Returns the store located in `data_dir`. Nothing is touched on disk.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PREVIOUS_BUILD_FILE),
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::MissingPrevious`] if nothing is stored, or
    /// [`TestbedError::Io`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<BuildId> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TestbedError::MissingPrevious);
            }
            Err(e) => return Err(TestbedError::io(&self.path, e)),
        };
        let id = String::from_utf8_lossy(&bytes);
        if id.is_empty() {
            return Err(TestbedError::MissingPrevious);
        }
        tracing::debug!(path = %self.path.display(), build = %id, "loaded previous build id");
        Ok(BuildId::new(id))
    }

    /// Overwrites the stored identifier, creating the data directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::Io`] if the directory or file cannot be written.
    pub fn save(&self, id: &BuildId) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TestbedError::io(parent, e))?;
        }
        std::fs::write(&self.path, id.as_str().as_bytes())
            .map_err(|e| TestbedError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), build = %id, "saved previous build id");
        Ok(())
    }
}

/// Loads the previous build identifier and fetches its configuration.
///
/// # Errors
///
/// Returns [`TestbedError::MissingPrevious`] if no identifier is stored,
/// before any RPC call is made, or the `get_build` error.
pub fn fetch_previous(
    rpc: &dyn RpcClient,
    store: &PreviousBuildStore,
) -> Result<(BuildId, BuildConfiguration)> {
    let id = store.load()?;
    let config = api::get_build(rpc, &id)?;
    Ok((id, config))
}
