//! Per-node CPU, memory and CPU pinning.

use testbed_common::error::{Result, TestbedError};
use testbed_common::types::grow_resources;

use super::SizedBuild;
use crate::normalize;

/// Which resource limits were given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourcesGiven {
    /// `--cpus` was given.
    pub cpus: bool,
    /// `--memory` was given.
    pub memory: bool,
}

/// Applies `--cpus` and `--memory` overrides.
///
/// Resources are first grown to the node count from entry 0. Each node then
/// takes its indexed value, else the unindexed default, else keeps what it
/// had.
///
/// # Errors
///
/// Returns the override parser's errors, or
/// [`TestbedError::IndexOutOfRange`] for an index past the last node.
pub fn apply(
    sized: &mut SizedBuild<'_>,
    cpus: Option<&[String]>,
    memory: Option<&[String]>,
) -> Result<ResourcesGiven> {
    let nodes = sized.nodes();
    let resources = &mut sized.document().resources;
    grow_resources(resources, nodes);

    if let Some(tokens) = cpus {
        let overrides = normalize::parse_indexed(tokens, "cpus")?;
        overrides.check_range("--cpus", nodes)?;
        for (i, node) in resources.iter_mut().enumerate() {
            if let Some(value) = overrides.value_for(i) {
                node.cpus = value.to_string();
            }
        }
    }
    if let Some(tokens) = memory {
        let overrides = normalize::parse_indexed(tokens, "memory")?;
        overrides.check_range("--memory", nodes)?;
        for (i, node) in resources.iter_mut().enumerate() {
            if let Some(value) = overrides.value_for(i) {
                node.memory = value.to_string();
            }
        }
    }
    Ok(ResourcesGiven {
        cpus: cpus.is_some(),
        memory: memory.is_some(),
    })
}

/// Sets the same limits on every node from interactive answers.
/// Fields answered `None` are left untouched.
pub fn apply_uniform(sized: &mut SizedBuild<'_>, cpus: Option<&str>, memory: Option<&str>) {
    let nodes = sized.nodes();
    let resources = &mut sized.document().resources;
    grow_resources(resources, nodes);
    for node in resources.iter_mut() {
        if let Some(cpus) = cpus {
            node.cpus = cpus.to_string();
        }
        if let Some(memory) = memory {
            node.memory = memory.to_string();
        }
    }
}

/// Pins `per_node` consecutive host CPUs to each node: node `i` gets
/// `[i * per_node, (i + 1) * per_node)`.
///
/// # Errors
///
/// Returns [`TestbedError::Config`] if the CPU numbers overflow.
pub fn apply_bound_cpus(sized: &mut SizedBuild<'_>, per_node: Option<usize>) -> Result<()> {
    let Some(per_node) = per_node else {
        return Ok(());
    };
    let nodes = sized.nodes();
    let resources = &mut sized.document().resources;
    grow_resources(resources, nodes);

    for (i, node) in resources.iter_mut().enumerate() {
        let overflow = || TestbedError::Config {
            message: format!("--bound-cpus {per_node} overflows at node {i}"),
        };
        let start = i.checked_mul(per_node).ok_or_else(overflow)?;
        let end = start.checked_add(per_node).ok_or_else(overflow)?;
        node.bound_cpus = (start..end).collect();
    }
    tracing::debug!(per_node, nodes, "bound cpus");
    Ok(())
}
