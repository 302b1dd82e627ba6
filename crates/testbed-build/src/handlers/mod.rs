//! Flag handlers that write into a [`BuildConfiguration`].
//!
//! Each handler is a no-op when its flag is absent. Handlers that touch a
//! per-node sequence take a [`SizedBuild`], which is only produced by
//! [`finalize_nodes`] once the node count can no longer change.

pub mod extras;
pub mod nodes;
pub mod params;
pub mod ports;
pub mod resources;
pub mod servers;

use testbed_common::constants::EOS_DEFAULT_VALIDATORS;
use testbed_common::error::{Result, TestbedError};
use testbed_common::types::BuildConfiguration;
use testbed_common::value::Value;

/// A build whose node count is final.
#[derive(Debug)]
pub struct SizedBuild<'a> {
    config: &'a mut BuildConfiguration,
}

impl SizedBuild<'_> {
    /// Final node count.
    pub const fn nodes(&self) -> usize {
        self.config.nodes
    }

    /// The document being assembled.
    pub fn document(&mut self) -> &mut BuildConfiguration {
        self.config
    }
}

/// Fixes the node count and returns the guard the per-node handlers need.
///
/// `validators` is recorded in `params.validators` when given. An `eos`
/// build gets its validators added to the node count, 21 unless given.
///
/// # Errors
///
/// Returns [`TestbedError::Config`] if the adjusted node count overflows.
pub fn finalize_nodes(
    config: &mut BuildConfiguration,
    validators: Option<usize>,
) -> Result<SizedBuild<'_>> {
    let overflow = || TestbedError::Config {
        message: "node count is too large".into(),
    };

    if let Some(count) = validators {
        let count = i64::try_from(count).map_err(|_| overflow())?;
        let _ = config
            .params
            .insert("validators".into(), Value::Int(count));
    }
    if config.blockchain == "eos" {
        let extra = validators.unwrap_or(EOS_DEFAULT_VALIDATORS);
        config.nodes = config.nodes.checked_add(extra).ok_or_else(overflow)?;
        tracing::debug!(validators = extra, nodes = config.nodes, "added eos validator nodes");
    }
    Ok(SizedBuild { config })
}
