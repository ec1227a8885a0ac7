//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `deploy-local` command-line tool. Every deploy stage has its own
//! subcommand, and `deploy` runs them all.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   options and calls into the `deploy_local` library.
//!
//! Configuration is resolved the same way for every command: the config
//! file, then `DEPLOY_LOCAL_*` environment variables, then flags.

pub mod activate;
pub mod checkout;
pub mod cleanup;
pub mod current;
pub mod deploy;
pub mod install;
pub mod prepare;
pub mod release;
pub mod releases;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use log::debug;

use deploy_local::config::{self, DeployConfig};
use deploy_local::defaults::CONFIG_FILE_NAME;
use deploy_local::suggestions;

/// Options shared by all subcommands
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub deploy_path: Option<PathBuf>,
    pub color: String,
}

/// Which repository and ref to check out
#[derive(Args, Debug, Default, Clone)]
pub struct SourceArgs {
    /// Git repository URL
    #[arg(long, value_name = "URL")]
    pub repository: Option<String>,

    /// Branch to check out
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Tag to check out (takes precedence over --branch)
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,
}

impl SourceArgs {
    fn apply(&self, config: &mut DeployConfig) {
        if let Some(repository) = &self.repository {
            config.repository = Some(repository.clone());
        }
        if let Some(branch) = &self.branch {
            config.branch = Some(branch.clone());
        }
        if let Some(tag) = &self.tag {
            config.tag = Some(tag.clone());
        }
    }
}

/// How many releases to keep
#[derive(Args, Debug, Default, Clone)]
pub struct RetentionArgs {
    /// Number of most recent releases to keep
    #[arg(long, value_name = "N")]
    pub keep_releases: Option<usize>,
}

impl RetentionArgs {
    fn apply(&self, config: &mut DeployConfig) {
        if let Some(keep) = self.keep_releases {
            config.keep_releases = keep;
        }
    }
}

/// Resolve the configuration for a command: file, environment, then flags.
///
/// An explicit `--config` must exist; the default `.deploy-local.yaml` is
/// optional since everything can also come from the environment.
pub fn load_config(global: &GlobalOptions) -> Result<DeployConfig> {
    let mut config = match &global.config {
        Some(path) => {
            if !path.exists() {
                return Err(suggestions::config_not_found(path));
            }
            read_config(path)?
        }
        None => {
            let default = Path::new(CONFIG_FILE_NAME);
            if default.exists() {
                read_config(default)?
            } else {
                debug!("no {} in the working directory, using defaults", CONFIG_FILE_NAME);
                DeployConfig::default()
            }
        }
    };

    config.apply_env().map_err(suggestions::explain)?;
    if let Some(path) = &global.deploy_path {
        config.deploy_path = path.clone();
    }
    Ok(config)
}

/// [`load_config`] plus the source flags of `checkout` and `deploy`.
pub fn load_config_with(
    global: &GlobalOptions,
    source: Option<&SourceArgs>,
    retention: Option<&RetentionArgs>,
) -> Result<DeployConfig> {
    let mut config = load_config(global)?;
    if let Some(source) = source {
        source.apply(&mut config);
    }
    if let Some(retention) = retention {
        retention.apply(&mut config);
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<DeployConfig> {
    debug!("loading {}", path.display());
    config::from_file(path).map_err(|e| {
        suggestions::explain(e).context(format!("Failed to load {}", path.display()))
    })
}
