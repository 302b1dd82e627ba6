//! Unified error types for the testbed workspace.
//!
//! Every variant is fatal at the point of detection: the binary prints it
//! and exits non-zero before any `build` call reaches the remote service.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum TestbedError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A value expected to be an integer could not be parsed.
    #[error("invalid integer for {field}: \"{raw}\"")]
    InvalidInteger {
        /// Name of the field being parsed.
        field: String,
        /// Raw text supplied by the user.
        raw: String,
    },

    /// A value expected to be a boolean is outside the accepted vocabulary.
    #[error("invalid boolean for {field}: \"{raw}\" (expected y, yes, 1, n, no or 0)")]
    InvalidBoolean {
        /// Name of the field being parsed.
        field: String,
        /// Raw text supplied by the user.
        raw: String,
    },

    /// An `index=value` token could not be parsed.
    #[error("malformed override \"{raw}\": {reason}")]
    MalformedOverride {
        /// Offending token.
        raw: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A port mapping token is not of the form `index=host:container`.
    #[error("malformed port mapping \"{raw}\" (expected index=host:container)")]
    MalformedPortMapping {
        /// Offending token.
        raw: String,
    },

    /// More than one unindexed default was supplied for a category.
    #[error("too many default {category}")]
    TooManyDefaults {
        /// Resource category, e.g. `cpus` or `images`.
        category: &'static str,
    },

    /// A per-node index lies outside `[0, nodes)`.
    #[error("index {index} is out of range for {flag} (build has {nodes} nodes)")]
    IndexOutOfRange {
        /// Flag carrying the index.
        flag: &'static str,
        /// Index given by the user.
        index: i64,
        /// Node count of the build.
        nodes: usize,
    },

    /// Auto-expose would bind the same host port twice.
    #[error("would duplicate exposed port {port}. Too many nodes to run auto expose")]
    DuplicatePort {
        /// Host port that collided.
        port: u32,
    },

    /// No previous build identifier is stored locally.
    #[error("no previous build. Use the build command to deploy a blockchain")]
    MissingPrevious,

    /// The parameter schema returned by `get_params` has an unexpected shape.
    #[error("unexpected format for params: {message}")]
    UnexpectedSchemaFormat {
        /// Description of the malformed entry.
        message: String,
    },

    /// An interactive prompt was required but stdin is not a terminal.
    #[error("not a tty: {message}")]
    NotATty {
        /// Context for the prompt that could not be shown.
        message: String,
    },

    /// Reading an answer from the terminal failed.
    #[error("prompt failed: {message}")]
    Prompt {
        /// Description of the failure.
        message: String,
    },

    /// The RPC transport or the remote service reported an error.
    #[error("rpc {method} failed: {message}")]
    Rpc {
        /// RPC method that failed.
        method: String,
        /// Message passed through from the transport or service.
        message: String,
    },

    /// A [`Value`](crate::value::Value) did not have the expected variant.
    #[error("expected {key} to be {expected}")]
    ShapeMismatch {
        /// Dotted path of the offending key.
        key: String,
        /// Expected variant name.
        expected: &'static str,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl TestbedError {
    /// Builds an [`TestbedError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an [`TestbedError::Rpc`] for the given method.
    pub fn rpc(method: &str, message: impl Into<String>) -> Self {
        Self::Rpc {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TestbedError>;
