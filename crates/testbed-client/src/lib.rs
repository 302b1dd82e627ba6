//! # testbed-client
//!
//! Everything that talks to the orchestration service or persists state
//! between invocations:
//! - [`RpcClient`](client::RpcClient) and its HTTP implementation.
//! - Typed wrappers for the service methods in [`api`].
//! - [`PreviousBuildStore`](store::PreviousBuildStore), the single-slot
//!   store of the last build identifier.
//! - [`submit`](submit::submit), which sends a build and records its ID.
//! - [`BuildListener`](listener::BuildListener), which follows a build
//!   until it finishes.

pub mod api;
pub mod client;
pub mod listener;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod store;
pub mod submit;
