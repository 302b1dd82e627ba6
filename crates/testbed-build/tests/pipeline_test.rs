//! End-to-end tests for build assembly and submission.
//!
//! These tests drive the whole flow without a terminal or a service:
//! 1. Assemble a document from flags (and an optional previous build)
//! 2. Check node sizing, per-node handlers and fatal input errors
//! 3. Submit through the previous-build store and fetch it back

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::{BTreeMap, VecDeque};

use testbed_build::flags::BuildFlags;
use testbed_build::images::ImageAliasTable;
use testbed_build::pipeline::{self, Assembly, BuildContext};
use testbed_build::prompt::Prompter;
use testbed_client::mock::MockRpc;
use testbed_client::store::{self, PreviousBuildStore};
use testbed_client::submit;
use testbed_common::error::{Result, TestbedError};
use testbed_common::types::BuildConfiguration;

#[derive(Debug, Default)]
struct Script {
    answers: VecDeque<String>,
    asked: usize,
}

impl Prompter for Script {
    fn read_line(&mut self, _prompt: &str) -> Result<String> {
        self.asked += 1;
        self.answers.pop_front().ok_or_else(|| TestbedError::NotATty {
            message: "no scripted answer".into(),
        })
    }

    fn notify(&mut self, _message: &str) {}
}

fn base_flags(blockchain: &str, nodes: usize) -> BuildFlags {
    BuildFlags {
        servers: Some(vec!["1".into()]),
        blockchain: Some(blockchain.into()),
        nodes: Some(nodes),
        cpus: Some(vec!["1".into()]),
        memory: Some(vec!["1GB".into()]),
        yes: true,
        ..BuildFlags::default()
    }
}

fn assemble(flags: &BuildFlags, rpc: &MockRpc) -> Result<Assembly> {
    assemble_from(flags, None, rpc)
}

fn assemble_from(
    flags: &BuildFlags,
    previous: Option<BuildConfiguration>,
    rpc: &MockRpc,
) -> Result<Assembly> {
    let images = ImageAliasTable::default();
    let mut script = Script::default();
    let mut ctx = BuildContext {
        rpc,
        images: &images,
        prompter: &mut script,
    };
    let assembly = pipeline::assemble(flags, previous, &mut ctx);
    assert_eq!(script.asked, 0, "fully flagged builds must not prompt");
    assembly
}

fn tokens(raw: &[&str]) -> Vec<String> {
    raw.iter().map(ToString::to_string).collect()
}

// ── Node sizing ──────────────────────────────────────────────────────

#[test]
fn pipeline_eos_validators_extend_node_count() {
    let flags = BuildFlags {
        validators: Some(5),
        ..base_flags("eos", 10)
    };
    let assembly = assemble(&flags, &MockRpc::new()).expect("assemble failed");
    let config = assembly.config();

    assert_eq!(config.nodes, 15);
    assert_eq!(config.blockchain, "eos");
    assert_eq!(config.images.len(), 15);
    assert_eq!(config.resources.len(), 15);
    assert_eq!(config.environments.len(), 15);
    assert_eq!(config.files.len(), 15);
}

#[test]
fn pipeline_blockchain_is_lower_cased() {
    let assembly = assemble(&base_flags("GETH", 1), &MockRpc::new()).expect("assemble failed");
    assert_eq!(assembly.config().blockchain, "geth");
}

// ── Previous build as defaults ───────────────────────────────────────

fn previous_build() -> BuildConfiguration {
    serde_json::from_value(serde_json::json!({
        "servers": [1],
        "blockchain": "geth",
        "nodes": 2,
        "images": ["geth:1", "geth:1"],
        "resources": [
            {"cpus": "2", "memory": "4GB", "ports": ["8545:8545"], "boundCPUs": [0, 1]},
            {"cpus": "2", "memory": "4GB", "ports": ["8546:8545"], "boundCPUs": [2, 3]}
        ],
        "params": {"chainId": 15},
        "extras": {"forceUnlock": true, "freezeAfterInfrastructure": true},
        "meta": {"startBlock": 10},
        "id": "old-build-id"
    }))
    .expect("parse failed")
}

#[test]
fn pipeline_growing_previous_build_leaves_new_nodes_unbound() {
    let flags = BuildFlags {
        blockchain: Some("geth".into()),
        nodes: Some(3),
        yes: true,
        ..BuildFlags::default()
    };
    let assembly =
        assemble_from(&flags, Some(previous_build()), &MockRpc::new()).expect("assemble failed");

    let resources = &assembly.config().resources;
    assert_eq!(resources[1].ports, vec!["8546:8545"]);
    assert_eq!(resources[2].cpus, "2");
    assert_eq!(resources[2].memory, "4GB");
    assert!(resources[2].ports.is_empty());
    assert!(resources[2].bound_cpus.is_empty());
}

#[test]
fn pipeline_previous_build_does_not_leak_one_shot_state() {
    let flags = BuildFlags {
        blockchain: Some("geth".into()),
        nodes: Some(2),
        yes: true,
        ..BuildFlags::default()
    };
    let assembly =
        assemble_from(&flags, Some(previous_build()), &MockRpc::new()).expect("assemble failed");
    let config = assembly.config();

    assert_eq!(config.nodes, 2);
    assert_eq!(config.servers, vec![1]);
    assert!(config.extras.is_empty(), "extras leaked: {:?}", config.extras);
    assert!(config.meta.is_empty());
    assert!(config.unknown.is_empty());
}

// ── Per-node handlers ────────────────────────────────────────────────

#[test]
fn pipeline_env_broadcasts_to_every_node() {
    let flags = BuildFlags {
        env: Some(tokens(&["FOO=bar"])),
        ..base_flags("geth", 3)
    };
    let assembly = assemble(&flags, &MockRpc::new()).expect("assemble failed");

    let expected = BTreeMap::from([("FOO".to_string(), "bar".to_string())]);
    assert_eq!(assembly.config().environments, vec![expected; 3]);
}

#[test]
fn pipeline_env_prefix_targets_one_node() {
    let flags = BuildFlags {
        env: Some(tokens(&["1:FOO=bar"])),
        ..base_flags("geth", 3)
    };
    let assembly = assemble(&flags, &MockRpc::new()).expect("assemble failed");

    let envs = &assembly.config().environments;
    assert!(envs[0].is_empty());
    assert_eq!(envs[1].get("FOO").map(String::as_str), Some("bar"));
    assert!(envs[2].is_empty());
}

#[test]
fn pipeline_expose_all_binds_linear_ports() {
    let flags = BuildFlags {
        expose_all: Some(vec![8545]),
        ..base_flags("geth", 2)
    };
    let assembly = assemble(&flags, &MockRpc::new()).expect("assemble failed");

    let resources = &assembly.config().resources;
    assert_eq!(resources[0].ports, vec!["8545:8545"]);
    assert_eq!(resources[1].ports, vec!["8546:8545"]);
}

#[test]
fn pipeline_resources_cover_every_node() {
    let flags = BuildFlags {
        cpus: Some(tokens(&["2", "0=4"])),
        memory: Some(tokens(&["2=8GB"])),
        ..base_flags("geth", 3)
    };
    let assembly = assemble(&flags, &MockRpc::new()).expect("assemble failed");

    let resources = &assembly.config().resources;
    assert_eq!(resources.len(), 3);
    let cpus: Vec<&str> = resources.iter().map(|r| r.cpus.as_str()).collect();
    assert_eq!(cpus, vec!["4", "2", "2"]);
    assert_eq!(resources[2].memory, "8GB");
}

// ── Fatal input errors ───────────────────────────────────────────────

#[test]
fn pipeline_duplicate_exposed_port_is_fatal() {
    let flags = BuildFlags {
        expose_all: Some(vec![8545, 8546]),
        ..base_flags("geth", 2)
    };
    let rpc = MockRpc::new();
    let err = assemble(&flags, &rpc).expect_err("should fail");

    assert!(matches!(err, TestbedError::DuplicatePort { .. }));
    assert_eq!(rpc.count("build"), 0);
}

#[test]
fn pipeline_template_index_out_of_range_reads_nothing() {
    let flags = BuildFlags {
        templates: Some(tokens(&["0;/a;/nonexistent/a", "7;/b;/nonexistent/b"])),
        ..base_flags("geth", 2)
    };
    let err = assemble(&flags, &MockRpc::new()).expect_err("should fail");
    assert!(matches!(err, TestbedError::IndexOutOfRange { index: 7, nodes: 2, .. }));
}

#[test]
fn pipeline_second_default_image_is_fatal() {
    let flags = BuildFlags {
        images: Some(tokens(&["a:1", "b:1"])),
        ..base_flags("geth", 2)
    };
    let err = assemble(&flags, &MockRpc::new()).expect_err("should fail");
    assert_eq!(err.to_string(), "too many default images");
}

#[test]
fn pipeline_non_integer_option_is_fatal() {
    let rpc = MockRpc::new().reply("get_params", serde_json::json!([["chainId", "int"]]));
    let flags = BuildFlags {
        options: Some(tokens(&["chainId=abc"])),
        ..base_flags("geth", 1)
    };
    let err = assemble(&flags, &rpc).expect_err("should fail");
    assert!(matches!(err, TestbedError::InvalidInteger { .. }));
}

// ── Submission ───────────────────────────────────────────────────────

#[test]
fn pipeline_debug_never_submits() {
    let rpc = MockRpc::new();
    let flags = BuildFlags {
        debug: true,
        ..base_flags("geth", 1)
    };
    let assembly = assemble(&flags, &rpc).expect("assemble failed");

    assert!(matches!(assembly, Assembly::Debug(_)));
    assert!(rpc.calls().is_empty());
}

#[test]
fn pipeline_submit_then_resubmit_previous_unchanged() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let store = PreviousBuildStore::new(dir.path());
    let assembly = assemble(&base_flags("geth", 2), &MockRpc::new()).expect("assemble failed");
    let Assembly::Submit(config) = assembly else {
        panic!("expected a submittable build");
    };

    let rpc = MockRpc::new().reply("build", serde_json::json!("b-1"));
    let id = submit::submit(&rpc, &store, &config, None).expect("submit failed");
    assert_eq!(id.as_str(), "b-1");
    let sent = rpc.calls()[0].1.clone();

    let rpc = MockRpc::new().reply("get_build", sent.clone());
    let (fetched_id, fetched): (_, BuildConfiguration) =
        store::fetch_previous(&rpc, &store).expect("fetch failed");
    assert_eq!(fetched_id, id);
    assert_eq!(serde_json::to_value(&fetched).expect("serialize failed"), sent);
}
