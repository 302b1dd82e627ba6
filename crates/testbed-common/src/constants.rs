//! System-wide constants and default paths.

use std::path::PathBuf;

/// Application name used for config directories and cache paths.
pub const APP_NAME: &str = "testbed";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "tb";

/// Default JSON-RPC endpoint.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default log filter when neither `RUST_LOG` nor `verbosity` is set.
pub const DEFAULT_VERBOSITY: &str = "error";

/// Default per-request HTTP timeout in milliseconds.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Default number of transport retries per RPC call.
pub const DEFAULT_HTTP_RETRIES: u32 = 5;

/// Default interval between build status polls in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/testbed/testbed.yaml";

/// System-wide image alias table.
pub const SYSTEM_IMAGE_TABLE: &str = "/etc/testbed/images.json";

/// File name holding the last build identifier inside the data directory.
pub const PREVIOUS_BUILD_FILE: &str = "previous_build_id";

/// Image tag used when no image is requested for a node.
pub const DEFAULT_IMAGE_TAG: &str = "stable";

/// Validator nodes added to an `eos` build when `--validators` is absent.
pub const EOS_DEFAULT_VALIDATORS: usize = 21;

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Returns the per-user configuration file, `$HOME/.config/testbed/testbed.yaml`.
pub fn user_config_file() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".config").join(APP_NAME).join("testbed.yaml"))
}

/// Returns the per-user image alias table, `$HOME/.config/testbed/images.json`.
pub fn user_image_table() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".config").join(APP_NAME).join("images.json"))
}

/// Returns the default data directory, `$HOME/.testbed`, or `./.testbed`
/// when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    home_dir().unwrap_or_default().join(format!(".{APP_NAME}"))
}

/// Returns the cached smart-contract artifact removed after each submission.
pub fn smart_contract_cache() -> Option<PathBuf> {
    home_dir().map(|home| {
        home.join("smart-contracts")
            .join(APP_NAME)
            .join("contracts.json")
    })
}
