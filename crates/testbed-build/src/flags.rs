//! Parsed command-line values for one `build` invocation.
//!
//! `None` (or `false`) means the flag was not given. Handlers never write
//! anything for an absent flag, so values seeded from a previous build or an
//! earlier handler survive.

use std::path::PathBuf;

/// Flag values collected by the CLI and consumed by the handlers.
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuildFlags {
    /// `--servers`: comma-separated server IDs.
    pub servers: Option<Vec<String>>,
    /// `--blockchain`
    pub blockchain: Option<String>,
    /// `--nodes`
    pub nodes: Option<usize>,
    /// `--cpus`: `value` or `index=value` tokens.
    pub cpus: Option<Vec<String>>,
    /// `--memory`: `value` or `index=value` tokens.
    pub memory: Option<Vec<String>>,
    /// `--file`: JSON file replacing the blockchain parameters.
    pub params_file: Option<PathBuf>,
    /// `--validators`
    pub validators: Option<usize>,
    /// `--image`: `name` or `index=name` tokens.
    pub images: Option<Vec<String>>,
    /// `--option`: `name=value` blockchain parameters.
    pub options: Option<Vec<String>>,
    /// `--env`: `KEY=value` or `index:KEY=value`.
    pub env: Option<Vec<String>>,
    /// `--template`: `dest;src` (or `dest=src`) and `index;dest;src`.
    pub templates: Option<Vec<String>>,
    /// `--docker-username`
    pub docker_username: Option<String>,
    /// `--docker-password`
    pub docker_password: Option<String>,
    /// `--user-ssh-key`: files holding public keys.
    pub ssh_keys: Option<Vec<PathBuf>>,
    /// `--force-docker-pull`
    pub force_docker_pull: bool,
    /// `--force-unlock`
    pub force_unlock: bool,
    /// `--freeze-before-genesis`
    pub freeze_before_genesis: bool,
    /// `--dockerfile`
    pub dockerfile: Option<PathBuf>,
    /// `--expose-port-mapping`: `index=host:container` tokens.
    pub port_mappings: Option<Vec<String>>,
    /// `--git-repo`
    pub git_repo: Option<String>,
    /// `--git-repo-branch`
    pub git_repo_branch: Option<String>,
    /// `--expose-all`: container ports exposed on every node.
    pub expose_all: Option<Vec<u16>>,
    /// `--start-logging-at-block`
    pub start_logging_at_block: Option<i64>,
    /// `--bound-cpus`: CPUs pinned per node.
    pub bound_cpus: Option<usize>,
    /// `--yes`: accept default parameters without asking.
    pub yes: bool,
    /// `--debug`: print the assembled document instead of submitting it.
    pub debug: bool,
}
