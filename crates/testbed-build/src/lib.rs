//! # testbed-build
//!
//! Turns command-line flags and interactive answers into one consistent
//! [`BuildConfiguration`](testbed_common::types::BuildConfiguration).
//!
//! The [`pipeline`] runs in a fixed order: prompts, servers, parameters,
//! node-count finalization, per-node handlers, then build-wide extras.
//! Per-node handlers take a [`SizedBuild`](handlers::SizedBuild), which only
//! [`finalize_nodes`](handlers::finalize_nodes) can produce.

pub mod flags;
pub mod handlers;
pub mod images;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
