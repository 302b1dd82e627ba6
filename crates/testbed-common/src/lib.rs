//! # testbed-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire testbed workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and owns the [`BuildConfiguration`](types::BuildConfiguration)
//! document that every other crate reads or mutates.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod value;
