//! Follows a build by polling `build_status` until it reaches a terminal state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use testbed_common::error::{Result, TestbedError};
use testbed_common::types::BuildId;

use crate::api::{self, BuildStatus};
use crate::client::RpcClient;

/// How a listening session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// The build reached 100% progress.
    Completed,
    /// The build is paused before genesis.
    Frozen,
    /// The user interrupted the listener; the build keeps running remotely.
    Interrupted,
}

/// Polls the status of one build at a fixed interval.
#[derive(Debug)]
pub struct BuildListener<'a> {
    rpc: &'a dyn RpcClient,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl<'a> BuildListener<'a> {
    /// Creates a listener polling every `interval`.
    pub fn new(rpc: &'a dyn RpcClient, interval: Duration) -> Self {
        Self {
            rpc,
            interval,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns the flag that keeps the listener running. Clearing it (for
    /// example from a Ctrl+C handler) ends [`listen`](Self::listen) with
    /// [`ListenOutcome::Interrupted`] before the next poll.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Polls until the build completes, freezes, fails or is interrupted.
    ///
    /// `on_update` is called whenever the stage or progress changes.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::Rpc`] if polling fails or the service
    /// reports a build error.
    pub fn listen(
        &self,
        id: &BuildId,
        mut on_update: impl FnMut(&BuildStatus),
    ) -> Result<ListenOutcome> {
        tracing::info!(build = %id, "listening for build status");
        let mut last: Option<BuildStatus> = None;

        while self.running.load(Ordering::SeqCst) {
            let status = api::build_status(self.rpc, id)?;
            if let Some(error) = &status.error {
                let message = error
                    .get("what")
                    .or_else(|| error.get("message"))
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(|| error.to_string(), str::to_string);
                return Err(TestbedError::rpc("build", message));
            }

            let changed = last.as_ref().is_none_or(|prev| {
                prev.stage != status.stage || (prev.progress - status.progress).abs() > f64::EPSILON
            });
            if changed {
                on_update(&status);
            }

            if status.frozen {
                return Ok(ListenOutcome::Frozen);
            }
            if status.progress >= 100.0 {
                return Ok(ListenOutcome::Completed);
            }
            last = Some(status);
            std::thread::sleep(self.interval);
        }

        tracing::info!(build = %id, "listener interrupted");
        Ok(ListenOutcome::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRpc;

    fn status(progress: f64, stage: &str) -> serde_json::Value {
        serde_json::json!({"progress": progress, "stage": stage, "error": null, "frozen": false})
    }

    #[test]
    fn listen_reports_changes_until_complete() {
        let rpc = MockRpc::new()
            .reply("build_status", status(10.0, "provisioning"))
            .reply("build_status", status(10.0, "provisioning"))
            .reply("build_status", status(60.0, "genesis"))
            .reply("build_status", status(100.0, "done"));
        let listener = BuildListener::new(&rpc, Duration::ZERO);

        let mut stages = Vec::new();
        let outcome = listener
            .listen(&BuildId::new("b"), |s| stages.push(s.stage.clone()))
            .expect("listen failed");

        assert_eq!(outcome, ListenOutcome::Completed);
        assert_eq!(stages, vec!["provisioning", "genesis", "done"]);
        assert_eq!(rpc.count("build_status"), 4);
    }

    #[test]
    fn listen_surfaces_build_error() {
        let rpc = MockRpc::new().reply(
            "build_status",
            serde_json::json!({"progress": 20.0, "error": {"what": "image pull failed"}}),
        );
        let listener = BuildListener::new(&rpc, Duration::ZERO);

        let err = listener.listen(&BuildId::new("b"), |_| {}).expect_err("should fail");
        assert!(err.to_string().contains("image pull failed"));
    }

    #[test]
    fn listen_stops_when_frozen() {
        let rpc = MockRpc::new().reply(
            "build_status",
            serde_json::json!({"progress": 50.0, "stage": "genesis", "frozen": true}),
        );
        let listener = BuildListener::new(&rpc, Duration::ZERO);
        let outcome = listener.listen(&BuildId::new("b"), |_| {}).expect("listen failed");
        assert_eq!(outcome, ListenOutcome::Frozen);
    }

    #[test]
    fn cleared_flag_interrupts_before_polling() {
        let rpc = MockRpc::new();
        let listener = BuildListener::new(&rpc, Duration::ZERO);
        listener.running_flag().store(false, Ordering::SeqCst);

        let outcome = listener.listen(&BuildId::new("b"), |_| {}).expect("listen failed");
        assert_eq!(outcome, ListenOutcome::Interrupted);
        assert_eq!(rpc.count("build_status"), 0);
    }
}
