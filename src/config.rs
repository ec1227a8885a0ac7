//! # Configuration
//!
//! This module defines [`DeployConfig`], the settings of a deploy run, and
//! how it is assembled from three layers, each overriding the previous one:
//!
//! 1.  **Config file**: a YAML document, `.deploy-local.yaml` by default.
//! 2.  **Environment**: `DEPLOY_LOCAL_*` variables (see [`ENV_PREFIX`]).
//! 3.  **Command line**: flags applied by the CLI after loading.
//!
//! ## File Format
//!
//! ```yaml
//! deploy_path: /srv/app
//! repository: git@github.com:org/app.git
//! branch: main
//! # tag: v1.4.0          # wins over branch when set
//! keep_releases: 5
//! timeout: 60            # seconds per external command
//! # git_cache: false     # skip the git version check and force shallow clones
//! bin:
//!   git: /usr/bin/git
//! install: "composer install --no-dev --prefer-dist"
//! env_vars:
//!   APP_ENV: prod
//! ```
//!
//! Every key is optional at load time. `repository` becomes required only
//! when a checkout is performed, see [`DeployConfig::require_repository`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Prefix of the environment variables that override config values.
pub const ENV_PREFIX: &str = "DEPLOY_LOCAL_";

/// Explicit binary locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinConfig {
    /// Path to the git executable; looked up on `PATH` when absent.
    #[serde(default)]
    pub git: Option<PathBuf>,
}

/// Settings of a deploy run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// The deploy root holding `releases/`, `shared/` and the links.
    #[serde(default = "defaults::default_deploy_path")]
    pub deploy_path: PathBuf,
    /// URL of the git repository to deploy.
    #[serde(default)]
    pub repository: Option<String>,
    /// Branch to check out.
    #[serde(default)]
    pub branch: Option<String>,
    /// Tag to check out; takes precedence over `branch`.
    #[serde(default)]
    pub tag: Option<String>,
    /// Number of most recent releases cleanup keeps.
    #[serde(default = "default_keep_releases")]
    pub keep_releases: usize,
    /// Ceiling on each external command, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Force the git-cache decision instead of checking the git version.
    #[serde(default)]
    pub git_cache: Option<bool>,
    #[serde(default)]
    pub bin: BinConfig,
    /// Dependency install command, run inside the new release.
    #[serde(default)]
    pub install: Option<String>,
    /// Environment variables exported for the install command.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

fn default_keep_releases() -> usize {
    defaults::KEEP_RELEASES
}

fn default_timeout() -> u64 {
    defaults::TIMEOUT_SECS
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            deploy_path: defaults::default_deploy_path(),
            repository: None,
            branch: None,
            tag: None,
            keep_releases: defaults::KEEP_RELEASES,
            timeout: defaults::TIMEOUT_SECS,
            git_cache: None,
            bin: BinConfig::default(),
            install: None,
            env_vars: BTreeMap::new(),
        }
    }
}

/// Parses a YAML string into a `DeployConfig`.
///
/// An empty document yields the defaults.
pub fn parse(yaml_content: &str) -> Result<DeployConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(DeployConfig::default());
    }
    let config: DeployConfig = serde_yaml::from_str(yaml_content)?;
    config.validate()?;
    Ok(config)
}

/// Parse a `DeployConfig` from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DeployConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

impl DeployConfig {
    /// Check values that serde can't express.
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(Error::ConfigParse {
                message: "timeout must be at least 1 second".to_string(),
            });
        }
        if self.deploy_path.as_os_str().is_empty() {
            return Err(Error::ConfigParse {
                message: "deploy_path must not be empty".to_string(),
            });
        }
        for key in self.env_vars.keys() {
            let valid = !key.is_empty()
                && !key.starts_with(|c: char| c.is_ascii_digit())
                && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(Error::ConfigParse {
                    message: format!("invalid environment variable name in env_vars: '{}'", key),
                });
            }
        }
        Ok(())
    }

    /// Apply `DEPLOY_LOCAL_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a full variable name
    /// (e.g. `DEPLOY_LOCAL_PATH`) to its value.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, suffix)).filter(|v| !v.is_empty())
        };

        if let Some(path) = var("PATH") {
            self.deploy_path = PathBuf::from(path);
        }
        if let Some(repository) = var("REPOSITORY") {
            self.repository = Some(repository);
        }
        if let Some(branch) = var("BRANCH") {
            self.branch = Some(branch);
        }
        if let Some(tag) = var("TAG") {
            self.tag = Some(tag);
        }
        if let Some(keep) = var("KEEP_RELEASES") {
            self.keep_releases = parse_env_number("KEEP_RELEASES", &keep)?;
        }
        if let Some(timeout) = var("TIMEOUT") {
            self.timeout = parse_env_number("TIMEOUT", &timeout)?;
        }
        if let Some(git_cache) = var("GIT_CACHE") {
            self.git_cache = Some(parse_env_bool("GIT_CACHE", &git_cache)?);
        }
        if let Some(git) = var("GIT") {
            self.bin.git = Some(PathBuf::from(git));
        }
        self.validate()
    }

    /// The repository URL, or a configuration error when it isn't set.
    pub fn require_repository(&self) -> Result<&str> {
        self.repository
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| Error::Config {
                message: "repository is not set".to_string(),
                hint: Some(format!(
                    "Add 'repository: <url>' to {}, set {}REPOSITORY, or pass --repository",
                    defaults::CONFIG_FILE_NAME,
                    ENV_PREFIX
                )),
            })
    }

    /// Per-command timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn parse_env_number<T: std::str::FromStr>(suffix: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::ConfigParse {
        message: format!("{}{} must be a non-negative integer, got '{}'", ENV_PREFIX, suffix, value),
    })
}

fn parse_env_bool(suffix: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::ConfigParse {
            message: format!("{}{} must be true or false, got '{}'", ENV_PREFIX, suffix, value),
        }),
    }
}
