//! Port bindings from `--expose-port-mapping` and `--expose-all`.

use std::collections::{BTreeMap, HashSet};

use testbed_common::error::{Result, TestbedError};
use testbed_common::types::{grow_resources, Resources};

use super::SizedBuild;
use crate::normalize;

/// Grows `resources` to `nodes` entries, then replaces the ports of every
/// node listed in `mapping`.
///
/// # Errors
///
/// Returns [`TestbedError::IndexOutOfRange`] for a node past the last one.
pub fn assign_ports(
    resources: &mut Vec<Resources>,
    nodes: usize,
    flag: &'static str,
    mapping: BTreeMap<i64, Vec<String>>,
) -> Result<()> {
    grow_resources(resources, nodes);
    for (index, ports) in mapping {
        let node = normalize::check_index(flag, index, nodes)?;
        tracing::trace!(node, ?ports, "assigning port mapping");
        resources[node].ports = ports;
    }
    Ok(())
}

/// Applies `index=host:container` bindings.
///
/// # Errors
///
/// Returns [`TestbedError::MalformedPortMapping`] or
/// [`TestbedError::IndexOutOfRange`].
pub fn apply_port_mappings(sized: &mut SizedBuild<'_>, tokens: Option<&[String]>) -> Result<()> {
    let Some(tokens) = tokens else {
        return Ok(());
    };
    let mapping = normalize::parse_port_mappings(tokens)?;
    let nodes = sized.nodes();
    assign_ports(
        &mut sized.document().resources,
        nodes,
        "--expose-port-mapping",
        mapping,
    )
}

/// Computes the bindings that expose each of `ports` on every node, node
/// `i` binding host port `port + i + offset`.
///
/// # Errors
///
/// Returns [`TestbedError::DuplicatePort`] if two bindings share a host
/// port, or [`TestbedError::Config`] if a host port would pass 65535.
pub fn expose_all_mapping(
    ports: &[u16],
    nodes: usize,
    offset: u16,
) -> Result<BTreeMap<i64, Vec<String>>> {
    let mut used = HashSet::new();
    let mut mapping = BTreeMap::new();
    for node in 0..nodes {
        let shift = u16::try_from(node)
            .ok()
            .and_then(|n| n.checked_add(offset))
            .ok_or_else(|| TestbedError::Config {
                message: format!("too many nodes to expose ports for node {node}"),
            })?;
        let mut bindings = Vec::with_capacity(ports.len());
        for &port in ports {
            let bound = port.checked_add(shift).ok_or_else(|| TestbedError::Config {
                message: format!("exposed port {port} on node {node} is past 65535"),
            })?;
            if !used.insert(bound) {
                return Err(TestbedError::DuplicatePort {
                    port: u32::from(bound),
                });
            }
            bindings.push(format!("{bound}:{port}"));
        }
        let index = i64::try_from(node).map_err(|_| TestbedError::Config {
            message: format!("node index {node} is too large"),
        })?;
        let _ = mapping.insert(index, bindings);
    }
    Ok(mapping)
}

/// Exposes `ports` linearly across every node.
///
/// # Errors
///
/// See [`expose_all_mapping`].
pub fn apply_expose_all(
    sized: &mut SizedBuild<'_>,
    ports: Option<&[u16]>,
    offset: u16,
) -> Result<()> {
    let Some(ports) = ports else {
        return Ok(());
    };
    let nodes = sized.nodes();
    let mapping = expose_all_mapping(ports, nodes, offset)?;
    assign_ports(&mut sized.document().resources, nodes, "--expose-all", mapping)
}
