//! The build configuration document and related domain primitives.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TestbedError};
use crate::value::ValueMap;

/// Opaque identifier the remote service assigns to a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildId(String);

impl BuildId {
    /// Creates a build ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-node resource limits and port bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// CPU limit; empty means no limit.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpus: String,
    /// Memory limit; empty means no limit.
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory: String,
    /// Port bindings of the form `host:container`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<String>,
    /// Host CPUs the node is pinned to.
    #[serde(
        rename = "boundCPUs",
        default,
        deserialize_with = "null_as_default"
    )]
    pub bound_cpus: Vec<usize>,
}

impl Resources {
    /// The limits a new node inherits from this one. Host ports and CPU
    /// pins belong to a single node and are not carried over.
    #[must_use]
    pub fn inherited(&self) -> Self {
        Self {
            cpus: self.cpus.clone(),
            memory: self.memory.clone(),
            ..Self::default()
        }
    }
}

/// The document submitted to the `build` RPC.
///
/// Every handler mutates one instance in place; it is serialized exactly
/// once at submission. Keys the service adds that are not modelled here
/// are kept in [`BuildConfiguration::unknown`] so a fetched build can be
/// resubmitted unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    /// Target server IDs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub servers: Vec<i64>,
    /// Lower-cased blockchain identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub blockchain: String,
    /// Total node count.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: usize,
    /// Container image per node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    /// Resource limits per node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<Resources>,
    /// Blockchain-specific tunables.
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: ValueMap,
    /// Environment variables per node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub environments: Vec<BTreeMap<String, String>>,
    /// Base64 file contents per node, keyed by destination path.
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<BTreeMap<String, String>>,
    /// Cross-cutting build options (prebuild, postbuild, force flags).
    #[serde(default, deserialize_with = "null_as_default")]
    pub extras: ValueMap,
    /// Informational flags that do not change build semantics.
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: ValueMap,
    /// Fields not modelled above, carried through verbatim.
    #[serde(flatten)]
    pub unknown: serde_json::Map<String, serde_json::Value>,
}

impl BuildConfiguration {
    /// Keeps what the next build inherits from this one: servers,
    /// blockchain, node count, images, resources and params.
    ///
    /// Environments, files, extras, meta and service-assigned fields apply
    /// to a single build and start empty.
    #[must_use]
    pub fn into_seed(self) -> Self {
        Self {
            servers: self.servers,
            blockchain: self.blockchain,
            nodes: self.nodes,
            images: self.images,
            resources: self.resources,
            params: self.params,
            ..Self::default()
        }
    }

    /// Resizes every per-node sequence to exactly `nodes` entries.
    ///
    /// Images grow by cloning entry 0 and resources by inheriting its
    /// limits; environments and files grow with empty maps. Surplus entries
    /// are dropped.
    pub fn fit_to_nodes(&mut self) {
        let nodes = self.nodes;
        grow_from_first(&mut self.images, nodes);
        grow_resources(&mut self.resources, nodes);
        self.environments.resize_with(nodes, BTreeMap::new);
        self.files.resize_with(nodes, BTreeMap::new);
    }

    /// Checks the invariants that must hold before submission.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::Config`] if the blockchain is empty or a
    /// per-node sequence does not match the node count.
    pub fn validate(&self) -> Result<()> {
        if self.blockchain.is_empty() {
            return Err(TestbedError::Config {
                message: "blockchain must not be empty".into(),
            });
        }
        if self.blockchain != self.blockchain.to_lowercase() {
            return Err(TestbedError::Config {
                message: format!("blockchain \"{}\" is not lower-cased", self.blockchain),
            });
        }
        let lengths = [
            ("images", self.images.len()),
            ("resources", self.resources.len()),
            ("environments", self.environments.len()),
            ("files", self.files.len()),
        ];
        for (name, len) in lengths {
            if len != self.nodes {
                return Err(TestbedError::Config {
                    message: format!("{name} has {len} entries but the build has {} nodes", self.nodes),
                });
            }
        }
        Ok(())
    }
}

/// Grows `items` to `len` by cloning the first entry (or the default).
pub fn grow_from_first<T: Clone + Default>(items: &mut Vec<T>, len: usize) {
    let template = items.first().cloned().unwrap_or_default();
    items.resize(len, template);
}

/// Grows `resources` to `len`; new nodes inherit the limits of entry 0.
pub fn grow_resources(resources: &mut Vec<Resources>, len: usize) {
    let template = resources.first().map(Resources::inherited).unwrap_or_default();
    resources.resize(len, template);
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_to_nodes_backfills_from_first_entry() {
        let mut config = BuildConfiguration {
            nodes: 3,
            images: vec!["geth:stable".into()],
            resources: vec![Resources {
                cpus: "2".into(),
                ..Resources::default()
            }],
            ..BuildConfiguration::default()
        };
        config.fit_to_nodes();

        assert_eq!(config.images, vec!["geth:stable"; 3]);
        assert!(config.resources.iter().all(|r| r.cpus == "2"));
        assert_eq!(config.environments.len(), 3);
        assert_eq!(config.files.len(), 3);
    }

    #[test]
    fn fit_to_nodes_does_not_copy_ports_or_pins() {
        let mut config = BuildConfiguration {
            nodes: 3,
            resources: vec![
                Resources {
                    cpus: "2".into(),
                    memory: "4GB".into(),
                    ports: vec!["8545:8545".into()],
                    bound_cpus: vec![0, 1],
                },
                Resources {
                    ports: vec!["8546:8545".into()],
                    bound_cpus: vec![2, 3],
                    ..Resources::default()
                },
            ],
            ..BuildConfiguration::default()
        };
        config.fit_to_nodes();

        let added = &config.resources[2];
        assert_eq!((added.cpus.as_str(), added.memory.as_str()), ("2", "4GB"));
        assert!(added.ports.is_empty());
        assert!(added.bound_cpus.is_empty());
        assert_eq!(config.resources[1].ports, vec!["8546:8545"]);
    }

    #[test]
    fn fit_to_nodes_truncates_surplus_entries() {
        let mut config = BuildConfiguration {
            nodes: 1,
            images: vec!["a".into(), "b".into()],
            ..BuildConfiguration::default()
        };
        config.fit_to_nodes();
        assert_eq!(config.images, vec!["a"]);
    }

    #[test]
    fn into_seed_drops_per_build_state() {
        let json = serde_json::json!({
            "servers": [4],
            "blockchain": "geth",
            "nodes": 1,
            "images": ["geth:stable"],
            "params": {"chainId": 15},
            "environments": [{"FOO": "bar"}],
            "files": [{"/genesis.json": "e30="}],
            "extras": {"forceUnlock": true, "freezeAfterInfrastructure": true},
            "meta": {"startBlock": 10},
            "id": "old-build-id"
        });
        let previous: BuildConfiguration = serde_json::from_value(json).expect("parse failed");

        let seed = previous.clone().into_seed();
        assert_eq!(seed.servers, previous.servers);
        assert_eq!(seed.images, previous.images);
        assert_eq!(seed.params, previous.params);
        assert!(seed.environments.is_empty() && seed.files.is_empty());
        assert!(seed.extras.is_empty() && seed.meta.is_empty());
        assert!(seed.unknown.is_empty());
    }

    #[test]
    fn validate_rejects_empty_blockchain() {
        let config = BuildConfiguration::default();
        assert!(matches!(config.validate(), Err(TestbedError::Config { .. })));
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let mut config = BuildConfiguration {
            blockchain: "geth".into(),
            nodes: 2,
            ..BuildConfiguration::default()
        };
        config.fit_to_nodes();
        let _ = config.images.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn null_collections_deserialize_as_empty() {
        let json = r#"{"blockchain": "eos", "nodes": 2, "servers": null, "resources": null}"#;
        let config: BuildConfiguration = serde_json::from_str(json).expect("parse failed");
        assert!(config.servers.is_empty());
        assert!(config.resources.is_empty());
    }

    #[test]
    fn fetched_document_round_trips_unchanged() {
        let json = serde_json::json!({
            "servers": [4],
            "blockchain": "geth",
            "nodes": 2,
            "images": ["gcr.io/geth:stable", "gcr.io/geth:stable"],
            "resources": [
                {"cpus": "2", "memory": "4GB", "ports": ["8545:8545"], "boundCPUs": [0, 1]},
                {"cpus": "", "memory": "", "ports": [], "boundCPUs": []}
            ],
            "params": {"chainId": 15, "extraAccounts": ["0xabc"], "gasLimit": 1.5},
            "environments": [{"FOO": "bar"}, {}],
            "files": [{}, {"/genesis.json": "e30="}],
            "extras": {"prebuild": {"pull": true}},
            "meta": {"startBlock": 10},
            "id": "server-assigned",
            "createdAt": 1_700_000_000
        });

        let config: BuildConfiguration =
            serde_json::from_value(json.clone()).expect("parse failed");
        assert_eq!(config.unknown.len(), 2);
        assert_eq!(serde_json::to_value(&config).expect("serialize failed"), json);
    }
}
