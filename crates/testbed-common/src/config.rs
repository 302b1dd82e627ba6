//! Layered CLI configuration.
//!
//! Sources, later wins: built-in defaults, `/etc/testbed/testbed.yaml`,
//! `$HOME/.config/testbed/testbed.yaml`, an explicit `--config` file, then
//! the environment (`API_URL`, `VERBOSITY`, `HTTP_TIMEOUT`, ...).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, TestbedError};

/// Root configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// JSON-RPC endpoint of the orchestration service.
    pub api_url: String,
    /// Log filter used when `RUST_LOG` is unset.
    pub verbosity: String,
    /// Per-request HTTP timeout in milliseconds.
    pub http_timeout: u64,
    /// Transport retries per RPC call.
    pub http_retries: u32,
    /// Interval between build status polls in milliseconds.
    pub poll_interval: u64,
    /// Explicit image alias table.
    #[serde(default)]
    pub image_table: Option<PathBuf>,
    /// Directory holding the previous build identifier.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.into(),
            verbosity: constants::DEFAULT_VERBOSITY.into(),
            http_timeout: constants::DEFAULT_HTTP_TIMEOUT_MS,
            http_retries: constants::DEFAULT_HTTP_RETRIES,
            poll_interval: constants::DEFAULT_POLL_INTERVAL_MS,
            image_table: None,
            data_dir: None,
        }
    }
}

impl CliConfig {
    /// Loads the configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::Config`] if a file is malformed, the explicit
    /// file is missing, or a value has the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut files = vec![(PathBuf::from(constants::SYSTEM_CONFIG_FILE), false)];
        if let Some(user) = constants::user_config_file() {
            files.push((user, false));
        }
        if let Some(path) = explicit {
            files.push((path.to_path_buf(), true));
        }
        Self::load_from(&files, Environment::default().try_parsing(true))
    }

    /// Loads the configuration from the given files and environment source.
    ///
    /// Each file is paired with whether it is required.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::Config`] on any source or type error.
    pub fn load_from(files: &[(PathBuf, bool)], env: Environment) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("api_url", defaults.api_url)
            .and_then(|b| b.set_default("verbosity", defaults.verbosity))
            .and_then(|b| b.set_default("http_timeout", defaults.http_timeout))
            .and_then(|b| b.set_default("http_retries", defaults.http_retries))
            .and_then(|b| b.set_default("poll_interval", defaults.poll_interval))
            .map_err(config_error)?;

        for (path, required) in files {
            if !required && !path.exists() {
                tracing::debug!(path = %path.display(), "config file not found, skipping");
                continue;
            }
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Yaml)
                    .required(*required),
            );
        }

        builder
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)
    }

    /// Returns the HTTP timeout as a [`Duration`].
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout)
    }

    /// Returns the poll interval as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    /// Returns the configured data directory or the default one.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(constants::default_data_dir)
    }
}

fn config_error(e: config::ConfigError) -> TestbedError {
    TestbedError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn no_env() -> Environment {
        Environment::default().source(Some(HashMap::new()))
    }

    #[test]
    fn load_without_sources_yields_defaults() {
        let config = CliConfig::load_from(&[], no_env()).expect("load failed");
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("testbed.yaml");
        std::fs::write(&path, "api_url: http://10.0.0.1:5000\nhttp_retries: 2\n")
            .expect("write failed");

        let config = CliConfig::load_from(&[(path, true)], no_env()).expect("load failed");
        assert_eq!(config.api_url, "http://10.0.0.1:5000");
        assert_eq!(config.http_retries, 2);
        assert_eq!(config.http_timeout, constants::DEFAULT_HTTP_TIMEOUT_MS);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("testbed.yaml");
        std::fs::write(&path, "verbosity: info\n").expect("write failed");

        let env = Environment::default().try_parsing(true).source(Some(HashMap::from([
            ("VERBOSITY".to_string(), "trace".to_string()),
            ("HTTP_TIMEOUT".to_string(), "250".to_string()),
        ])));
        let config = CliConfig::load_from(&[(path, true)], env).expect("load failed");
        assert_eq!(config.verbosity, "trace");
        assert_eq!(config.http_timeout, 250);
    }

    #[test]
    fn missing_optional_file_is_skipped() {
        let files = [(PathBuf::from("/nonexistent/testbed.yaml"), false)];
        assert!(CliConfig::load_from(&files, no_env()).is_ok());
    }

    #[test]
    fn missing_required_file_is_a_config_error() {
        let files = [(PathBuf::from("/nonexistent/testbed.yaml"), true)];
        let err = CliConfig::load_from(&files, no_env()).expect_err("should fail");
        assert!(matches!(err, TestbedError::Config { .. }));
    }
}
