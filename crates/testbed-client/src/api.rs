//! Typed wrappers for the orchestration service methods.

use serde::Deserialize;
use testbed_common::error::{Result, TestbedError};
use testbed_common::types::{BuildConfiguration, BuildId};

use crate::client::RpcClient;

/// A server the service can place nodes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Key of the server in the `get_servers` reply.
    pub name: String,
    /// Numeric server ID used in [`BuildConfiguration::servers`].
    pub id: i64,
}

/// Type of a blockchain-specific parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// `string`
    String,
    /// `[]string`, entered as a comma or space separated list.
    StringList,
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// A type this client does not know how to enter.
    Unsupported(String),
}

impl ParamKind {
    fn from_wire(raw: &str) -> Self {
        match raw {
            "string" => Self::String,
            "[]string" => Self::StringList,
            "int" => Self::Int,
            "bool" => Self::Bool,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Returns the type name as the service spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::StringList => "[]string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Unsupported(raw) => raw,
        }
    }
}

/// One `(name, type)` entry of a parameter schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub kind: ParamKind,
}

/// Progress report for a running build.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildStatus {
    /// Completion percentage, 0 to 100.
    #[serde(default)]
    pub progress: f64,
    /// Human-readable stage name.
    #[serde(default)]
    pub stage: String,
    /// Error reported by the service, if the build failed.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    /// Whether the build is paused before genesis.
    #[serde(default)]
    pub frozen: bool,
}

/// Starts a build and returns its identifier.
///
/// # Errors
///
/// Returns [`TestbedError::Rpc`] if the call fails or the reply is not a
/// string identifier.
pub fn build(rpc: &dyn RpcClient, config: &BuildConfiguration) -> Result<BuildId> {
    let reply = rpc.call("build", serde_json::to_value(config)?)?;
    match reply {
        serde_json::Value::String(id) if !id.is_empty() => Ok(BuildId::new(id)),
        other => Err(TestbedError::rpc(
            "build",
            format!("expected a build identifier, got {other}"),
        )),
    }
}

/// Fetches the configuration of an earlier build.
///
/// # Errors
///
/// Returns an error if the call fails or the reply is not a build document.
pub fn get_build(rpc: &dyn RpcClient, id: &BuildId) -> Result<BuildConfiguration> {
    let reply = rpc.call("get_build", serde_json::json!([id.as_str()]))?;
    Ok(serde_json::from_value(reply)?)
}

/// Lists the servers available to this account.
///
/// # Errors
///
/// Returns [`TestbedError::Rpc`] if the call fails or a descriptor has no
/// integer `id`.
pub fn get_servers(rpc: &dyn RpcClient) -> Result<Vec<ServerInfo>> {
    let reply = rpc.call("get_servers", serde_json::json!([]))?;
    let serde_json::Value::Object(servers) = reply else {
        return Err(TestbedError::rpc("get_servers", "expected a map of servers"));
    };
    servers
        .into_iter()
        .map(|(name, descriptor)| {
            let id = descriptor
                .get("id")
                .and_then(serde_json::Value::as_i64)
                .ok_or_else(|| {
                    TestbedError::rpc("get_servers", format!("server {name} has no integer id"))
                })?;
            Ok(ServerInfo { name, id })
        })
        .collect()
}

/// Fetches the parameter schema for a blockchain.
///
/// # Errors
///
/// Returns [`TestbedError::UnexpectedSchemaFormat`] unless the reply is a
/// list of `[name, type]` string pairs.
pub fn get_params(rpc: &dyn RpcClient, blockchain: &str) -> Result<Vec<ParamSpec>> {
    let reply = rpc.call("get_params", serde_json::json!([blockchain]))?;
    parse_schema(&reply)
}

/// Parses a `get_params` reply.
///
/// # Errors
///
/// Returns [`TestbedError::UnexpectedSchemaFormat`] on any shape mismatch.
pub fn parse_schema(reply: &serde_json::Value) -> Result<Vec<ParamSpec>> {
    let entries = reply
        .as_array()
        .ok_or_else(|| TestbedError::UnexpectedSchemaFormat {
            message: format!("expected a list, got {reply}"),
        })?;
    entries
        .iter()
        .map(|entry| match entry.as_array().map(Vec::as_slice) {
            Some([serde_json::Value::String(name), serde_json::Value::String(kind)]) => {
                Ok(ParamSpec {
                    name: name.clone(),
                    kind: ParamKind::from_wire(kind),
                })
            }
            _ => Err(TestbedError::UnexpectedSchemaFormat {
                message: format!("expected a [name, type] pair, got {entry}"),
            }),
        })
        .collect()
}

/// Asks the service to halt a build.
///
/// # Errors
///
/// Returns [`TestbedError::Rpc`] if the call fails.
pub fn stop_build(rpc: &dyn RpcClient, id: &BuildId) -> Result<serde_json::Value> {
    rpc.call("stop_build", serde_json::json!([id.as_str()]))
}

/// Fetches the current progress of a build.
///
/// # Errors
///
/// Returns an error if the call fails or the reply is malformed.
pub fn build_status(rpc: &dyn RpcClient, id: &BuildId) -> Result<BuildStatus> {
    let reply = rpc.call("build_status", serde_json::json!([id.as_str()]))?;
    Ok(serde_json::from_value(reply)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRpc;

    #[test]
    fn build_returns_identifier_and_sends_document() {
        let rpc = MockRpc::new().reply("build", serde_json::json!("b-42"));
        let config = BuildConfiguration {
            blockchain: "geth".into(),
            nodes: 1,
            ..BuildConfiguration::default()
        };

        let id = build(&rpc, &config).expect("build failed");
        assert_eq!(id.as_str(), "b-42");

        let calls = rpc.calls();
        assert_eq!(calls[0].0, "build");
        assert_eq!(calls[0].1["blockchain"], "geth");
    }

    #[test]
    fn build_rejects_non_string_reply() {
        let rpc = MockRpc::new().reply("build", serde_json::json!({"id": 1}));
        let err = build(&rpc, &BuildConfiguration::default()).expect_err("should fail");
        assert!(matches!(err, TestbedError::Rpc { .. }));
    }

    #[test]
    fn get_servers_extracts_ids() {
        let rpc = MockRpc::new().reply(
            "get_servers",
            serde_json::json!({"alpha": {"id": 3, "addr": "10.0.0.3"}, "beta": {"id": 7}}),
        );
        let servers = get_servers(&rpc).expect("get_servers failed");
        assert_eq!(
            servers,
            vec![
                ServerInfo { name: "alpha".into(), id: 3 },
                ServerInfo { name: "beta".into(), id: 7 },
            ]
        );
    }

    #[test]
    fn get_servers_rejects_descriptor_without_id() {
        let rpc = MockRpc::new().reply("get_servers", serde_json::json!({"alpha": {}}));
        assert!(get_servers(&rpc).is_err());
    }

    #[test]
    fn parse_schema_reads_name_type_pairs() {
        let reply = serde_json::json!([["chainId", "int"], ["bootnodes", "[]string"], ["x", "float"]]);
        let schema = parse_schema(&reply).expect("parse failed");
        assert_eq!(schema[0].kind, ParamKind::Int);
        assert_eq!(schema[1].kind, ParamKind::StringList);
        assert_eq!(schema[2].kind, ParamKind::Unsupported("float".into()));
    }

    #[test]
    fn parse_schema_rejects_wrong_arity() {
        let reply = serde_json::json!([["chainId"]]);
        let err = parse_schema(&reply).expect_err("should fail");
        assert!(matches!(err, TestbedError::UnexpectedSchemaFormat { .. }));
    }

    #[test]
    fn parse_schema_rejects_non_list() {
        let err = parse_schema(&serde_json::json!({"chainId": "int"})).expect_err("should fail");
        assert!(matches!(err, TestbedError::UnexpectedSchemaFormat { .. }));
    }

    #[test]
    fn build_status_decodes_progress() {
        let rpc = MockRpc::new().reply(
            "build_status",
            serde_json::json!({"progress": 40.0, "stage": "provisioning", "error": null}),
        );
        let status = build_status(&rpc, &BuildId::new("b")).expect("status failed");
        assert!((status.progress - 40.0).abs() < f64::EPSILON);
        assert_eq!(status.stage, "provisioning");
        assert!(status.error.is_none());
        assert!(!status.frozen);
    }
}
