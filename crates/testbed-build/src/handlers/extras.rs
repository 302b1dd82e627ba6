//! Build-wide options written under `extras` and `meta`.
//!
//! Every key is written only when its flag is given; parent maps are
//! created on first write.

use testbed_common::error::{Result, TestbedError};
use testbed_common::types::BuildConfiguration;
use testbed_common::value::{self, Value, ValueMap};

use super::nodes::read_base64;
use crate::flags::BuildFlags;

/// Runs every extras handler in order.
///
/// # Errors
///
/// Returns the first handler error.
pub fn apply(flags: &BuildFlags, config: &mut BuildConfiguration) -> Result<()> {
    apply_ssh_keys(flags, config)?;
    apply_docker_auth(flags, config)?;
    apply_dockerfile(flags, config)?;
    apply_repo_build(flags, config)?;
    apply_pull(flags, config)?;
    apply_force_unlock(flags, config);
    apply_freeze(flags, config);
    apply_start_block(flags, config);
    Ok(())
}

/// `postbuild.ssh.pubKeys`: contents of every `--user-ssh-key` file.
///
/// # Errors
///
/// Returns [`TestbedError::Io`] if a key file cannot be read.
pub fn apply_ssh_keys(flags: &BuildFlags, config: &mut BuildConfiguration) -> Result<()> {
    let Some(paths) = &flags.ssh_keys else {
        return Ok(());
    };
    let keys = paths
        .iter()
        .map(|path| std::fs::read_to_string(path).map_err(|e| TestbedError::io(path, e)))
        .collect::<Result<Vec<_>>>()?;
    value::set_path(&mut config.extras, &["postbuild", "ssh", "pubKeys"], keys)
}

/// `prebuild.auth`: registry credentials. Both halves must be given.
///
/// # Errors
///
/// Returns [`TestbedError::Config`] if only one of username and password
/// is given.
pub fn apply_docker_auth(flags: &BuildFlags, config: &mut BuildConfiguration) -> Result<()> {
    let (username, password) = match (&flags.docker_username, &flags.docker_password) {
        (None, None) => return Ok(()),
        (Some(_), None) => {
            return Err(TestbedError::Config {
                message: "you must also provide --docker-password with --docker-username".into(),
            });
        }
        (None, Some(_)) => {
            return Err(TestbedError::Config {
                message: "you must also provide --docker-username with --docker-password".into(),
            });
        }
        (Some(username), Some(password)) => (username, password),
    };
    let auth = ValueMap::from([
        ("username".to_string(), Value::from(username.as_str())),
        ("password".to_string(), Value::from(password.as_str())),
    ]);
    value::set_path(&mut config.extras, &["prebuild", "auth"], auth)
}

/// `prebuild.build` and `prebuild.dockerfile` (base64 file contents).
///
/// # Errors
///
/// Returns [`TestbedError::Io`] if the Dockerfile cannot be read.
pub fn apply_dockerfile(flags: &BuildFlags, config: &mut BuildConfiguration) -> Result<()> {
    let Some(path) = flags.dockerfile.as_deref().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    let encoded = read_base64(path)?;
    let prebuild = value::map_at(&mut config.extras, &["prebuild"])?;
    let _ = prebuild.insert("build".into(), Value::Bool(true));
    let _ = prebuild.insert("dockerfile".into(), Value::Str(encoded));
    Ok(())
}

/// `prebuild.build`, `prebuild.repo` and, when given, `prebuild.branch`.
///
/// # Errors
///
/// Returns [`TestbedError::ShapeMismatch`] if `prebuild` is not a map.
pub fn apply_repo_build(flags: &BuildFlags, config: &mut BuildConfiguration) -> Result<()> {
    let Some(repo) = &flags.git_repo else {
        return Ok(());
    };
    let prebuild = value::map_at(&mut config.extras, &["prebuild"])?;
    let _ = prebuild.insert("build".into(), Value::Bool(true));
    let _ = prebuild.insert("repo".into(), Value::from(repo.as_str()));
    if let Some(branch) = &flags.git_repo_branch {
        tracing::trace!(%branch, "given a git repo branch");
        let _ = prebuild.insert("branch".into(), Value::from(branch.as_str()));
    }
    Ok(())
}

/// `prebuild.pull = true` with `--force-docker-pull`.
///
/// # Errors
///
/// Returns [`TestbedError::ShapeMismatch`] if `prebuild` is not a map.
pub fn apply_pull(flags: &BuildFlags, config: &mut BuildConfiguration) -> Result<()> {
    if !flags.force_docker_pull {
        return Ok(());
    }
    value::set_path(&mut config.extras, &["prebuild", "pull"], true)
}

/// `forceUnlock = true` with `--force-unlock`.
pub fn apply_force_unlock(flags: &BuildFlags, config: &mut BuildConfiguration) {
    if flags.force_unlock {
        let _ = config.extras.insert("forceUnlock".into(), Value::Bool(true));
    }
}

/// `freezeAfterInfrastructure = true` with `--freeze-before-genesis`.
pub fn apply_freeze(flags: &BuildFlags, config: &mut BuildConfiguration) {
    if flags.freeze_before_genesis {
        let _ = config
            .extras
            .insert("freezeAfterInfrastructure".into(), Value::Bool(true));
    }
}

/// `meta.startBlock` from `--start-logging-at-block`.
pub fn apply_start_block(flags: &BuildFlags, config: &mut BuildConfiguration) {
    if let Some(block) = flags.start_logging_at_block {
        let _ = config.meta.insert("startBlock".into(), Value::Int(block));
    }
}
