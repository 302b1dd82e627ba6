//! Formatted output helpers for CLI commands.

use serde::Serialize;
use testbed_client::api::BuildStatus;

/// Renders any serializable value as indented JSON.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Formats one progress line, e.g. `[ 42.5%] provisioning`.
pub fn format_progress(status: &BuildStatus) -> String {
    let progress = status.progress.clamp(0.0, 100.0);
    if status.stage.is_empty() {
        format!("[{progress:5.1}%]")
    } else {
        format!("[{progress:5.1}%] {}", status.stage)
    }
}
