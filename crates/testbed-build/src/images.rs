//! Blockchain image alias table.
//!
//! Maps `(blockchain, requested name)` to a concrete container image. The
//! table is a JSON file of the form
//! `{"blockchains": {"geth": {"images": {"stable": "gcr.io/geth:1.9"}}}}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use testbed_common::constants;
use testbed_common::error::{Result, TestbedError};

/// Image aliases per blockchain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageAliasTable {
    #[serde(default)]
    blockchains: BTreeMap<String, BlockchainImages>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BlockchainImages {
    #[serde(default)]
    images: BTreeMap<String, String>,
}

impl ImageAliasTable {
    /// Reads a table from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid table.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TestbedError::io(path, e))?;
        let table = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded image alias table");
        Ok(table)
    }

    /// Loads `explicit` if given, else the first table found among the
    /// system and user locations. No table at all yields an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` is missing, or a found table is malformed.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidates = std::iter::once(PathBuf::from(constants::SYSTEM_IMAGE_TABLE))
            .chain(constants::user_image_table());
        for path in candidates {
            if path.exists() {
                return Self::load(&path);
            }
        }
        tracing::debug!("no image alias table found, using requested names verbatim");
        Ok(Self::default())
    }

    /// Returns the aliased image for `name`, or `name` itself.
    pub fn resolve(&self, blockchain: &str, name: &str) -> String {
        self.blockchains
            .get(blockchain)
            .and_then(|b| b.images.get(name))
            .filter(|image| !image.is_empty())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}
