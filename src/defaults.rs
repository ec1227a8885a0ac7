//! Default values for deploy-local configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = ".deploy-local.yaml";

/// Releases kept by cleanup unless configured otherwise.
pub const KEEP_RELEASES: usize = 5;

/// Ceiling on the wall time of each external command, in seconds.
pub const TIMEOUT_SECS: u64 = 60;

/// Returns the default deploy root: `deployer` under the system temp
/// directory (`/tmp/deployer` on most Unix systems).
///
/// This can be overridden by the `deploy_path` config key, the
/// `DEPLOY_LOCAL_PATH` environment variable or the `--deploy-path` flag.
pub fn default_deploy_path() -> PathBuf {
    std::env::temp_dir().join("deployer")
}
