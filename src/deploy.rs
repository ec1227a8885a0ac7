//! # Deploy Pipeline
//!
//! [`Deployer`] runs the stages of a local deploy against one deploy root:
//!
//! 1.  **Prepare**: create `releases/` and `shared/`.
//! 2.  **Release**: allocate a timestamped release and point `release` at it.
//! 3.  **Update code**: clone the repository into the release, reusing the
//!     previous release as an object cache when possible.
//! 4.  **Install**: run the configured dependency install command, if any.
//! 5.  **Activate**: swap `current` to the new release, drop `release`.
//! 6.  **Cleanup**: delete releases beyond `keep_releases`.
//!
//! Each stage is also callable on its own, so the CLI can expose them as
//! separate subcommands. Stages that need the release being prepared find it
//! through the pending `release` link, the same way a fresh process would.
//!
//! Stages run strictly in sequence and nothing locks the deploy root:
//! concurrent deploys to the same root must be serialized by the caller.
//! A failing stage stops the run; whatever earlier stages produced stays on
//! disk for inspection.

use std::path::PathBuf;

use log::info;

use crate::activation;
use crate::checkout::{self, CheckoutRequest, CheckoutStrategy};
use crate::command::{shell_quote, CommandRunner, ShellRunner};
use crate::config::DeployConfig;
use crate::error::{Error, Result};
use crate::git::{self, GitRef};
use crate::layout::DeployRoot;
use crate::release::{self, AllocatedRelease, Clock, ReleaseName, SystemClock};
use crate::retention::{self, CleanupReport};
use crate::template;
use crate::vars::{names, Variables};

/// Summary of a full deploy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub release: ReleaseName,
    pub strategy: CheckoutStrategy,
    /// Whether an install command ran
    pub installed: bool,
    pub cleanup: CleanupReport,
}

/// A release as seen by `releases` listings
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReleaseEntry {
    pub name: String,
    pub path: PathBuf,
    pub current: bool,
    pub pending: bool,
}

/// Runs deploy stages for one configuration
pub struct Deployer {
    config: DeployConfig,
    root: DeployRoot,
    runner: Box<dyn CommandRunner>,
    clock: Box<dyn Clock>,
    vars: Variables,
}

impl Deployer {
    /// Creates a `Deployer` that runs real commands and uses the wall clock.
    pub fn new(config: DeployConfig) -> Self {
        Self::with_operations(config, Box::new(ShellRunner::new()), Box::new(SystemClock))
    }

    /// Creates a `Deployer` with custom command execution and clock.
    ///
    /// This is primarily used for testing to inject mock operations.
    pub fn with_operations(
        config: DeployConfig,
        runner: Box<dyn CommandRunner>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let root = DeployRoot::new(config.deploy_path.clone());
        let mut vars = Variables::new();
        vars.set(names::DEPLOY_PATH, config.deploy_path.to_string_lossy());
        // Unset source settings render as empty strings
        for (name, value) in [
            (names::REPOSITORY, &config.repository),
            (names::BRANCH, &config.branch),
            (names::TAG, &config.tag),
        ] {
            vars.set(name, value.as_deref().map(str::trim).unwrap_or_default());
        }
        vars.set(names::ENV_VARS, render_env_vars(&config));

        Self {
            config,
            root,
            runner,
            clock,
            vars,
        }
    }

    pub fn root(&self) -> &DeployRoot {
        &self.root
    }

    /// Run every stage in order.
    pub fn run(&mut self) -> Result<DeployReport> {
        self.prepare()?;
        let allocated = self.release()?;
        let strategy = self.update_code()?;
        let installed = self.install()?;
        self.activate()?;
        let cleanup = self.cleanup()?;

        Ok(DeployReport {
            release: allocated.name,
            strategy,
            installed,
            cleanup,
        })
    }

    /// Stage 1: make sure the deploy root layout exists.
    pub fn prepare(&mut self) -> Result<()> {
        info!("Preparing deploy root {}", self.root.path().display());
        self.root.prepare()
    }

    /// Stage 2: allocate a release directory and point `release` at it.
    pub fn release(&mut self) -> Result<AllocatedRelease> {
        let allocated = release::allocate(&self.root, self.clock.as_ref())?;
        self.vars
            .set(names::RELEASE_PATH, allocated.path.to_string_lossy());
        Ok(allocated)
    }

    /// Path of the release being prepared, read from the pending link.
    pub fn release_path(&mut self) -> Result<PathBuf> {
        let root = &self.root;
        let path = self.vars.get_or_resolve(names::RELEASE_PATH, || {
            let name = root.pending_release()?.ok_or_else(|| Error::Config {
                message: format!("no release in progress under {}", root.path().display()),
                hint: Some("Run 'deploy-local release' first".to_string()),
            })?;
            Ok(root.release_dir(&name).to_string_lossy().into_owned())
        })?;
        Ok(PathBuf::from(path))
    }

    /// The git executable: `bin.git` from the config, else found on `PATH`.
    pub fn git_bin(&mut self) -> Result<PathBuf> {
        let configured = self.config.bin.git.clone();
        let path = self.vars.get_or_resolve(names::GIT_BIN, || {
            let path = match configured {
                Some(path) => path,
                None => git::find_git_binary()?,
            };
            Ok(path.to_string_lossy().into_owned())
        })?;
        Ok(PathBuf::from(path))
    }

    /// Whether reference clones are used. Taken from `git_cache` in the
    /// config when set, otherwise from the installed git version; decided
    /// once per run.
    pub fn git_cache(&mut self) -> Result<bool> {
        if let Some(forced) = self.config.git_cache {
            return self.vars.get_or_resolve_flag(names::GIT_CACHE, || Ok(forced));
        }
        if let Some(value) = self.vars.get(names::GIT_CACHE) {
            return Ok(value == "true");
        }

        let git_bin = self.git_bin()?;
        let runner = self.runner.as_ref();
        let timeout = self.config.timeout();
        self.vars.get_or_resolve_flag(names::GIT_CACHE, || {
            let version = git::detect_version(runner, &git_bin, timeout)?;
            let supported = git::supports_reference_cache(&version);
            info!(
                "git {} {} reference clones",
                version,
                if supported { "supports" } else { "does not support" }
            );
            Ok(supported)
        })
    }

    /// Stage 3: clone the repository into the pending release.
    pub fn update_code(&mut self) -> Result<CheckoutStrategy> {
        let repository = self.config.require_repository()?.to_string();
        let destination = self.release_path()?;
        let git_bin = self.git_bin()?;
        let git_cache = self.git_cache()?;

        let releases = self.root.list_releases()?;
        let request = CheckoutRequest {
            git_bin,
            repository,
            git_ref: GitRef::resolve(self.config.tag.as_deref(), self.config.branch.as_deref()),
            reference: checkout::cache_reference(&self.root, &releases, git_cache),
            destination,
            git_cache,
            timeout: self.config.timeout(),
        };

        let strategy = checkout::checkout(self.runner.as_ref(), &request)?;
        info!("Checked out {} ({})", request.git_ref, strategy);
        Ok(strategy)
    }

    /// Stage 4: run the install command inside the pending release.
    ///
    /// Returns `false` when no install command is configured.
    pub fn install(&mut self) -> Result<bool> {
        let Some(install) = self.config.install.clone() else {
            info!("No install command configured, skipping");
            return Ok(false);
        };

        let release_path = self.release_path()?;
        // A standalone `install` has not resolved the git settings yet
        for name in template::placeholders(&install)? {
            match name.as_str() {
                names::GIT_BIN => {
                    self.git_bin()?;
                }
                names::GIT_CACHE => {
                    self.git_cache()?;
                }
                _ => {}
            }
        }
        let rendered = self.vars.render(&install)?;
        let env_vars = self.vars.get(names::ENV_VARS).unwrap_or_default();
        let prefix = if env_vars.is_empty() {
            String::new()
        } else {
            format!("{} ", env_vars)
        };
        let command = format!(
            "cd {} && {}{}",
            shell_quote(&release_path.to_string_lossy()),
            prefix,
            rendered
        );

        info!("Installing dependencies");
        self.runner.run(&command, self.config.timeout())?;
        Ok(true)
    }

    /// Stage 5: make the pending release current.
    pub fn activate(&mut self) -> Result<ReleaseName> {
        let release_path = self.release_path()?;
        let name = activation::activate(&self.root, &release_path)?;
        self.vars.forget(names::RELEASE_PATH);
        Ok(name)
    }

    /// Stage 6: delete releases beyond `keep_releases`.
    pub fn cleanup(&mut self) -> Result<CleanupReport> {
        retention::cleanup(&self.root, self.config.keep_releases)
    }

    /// Release `current` points at.
    pub fn current(&self) -> Result<Option<ReleaseName>> {
        self.root.current_release()
    }

    /// All releases, most recent first.
    pub fn releases(&self) -> Result<Vec<ReleaseEntry>> {
        let current = self.root.current_release()?;
        let pending = self.root.pending_release()?;
        Ok(self
            .root
            .list_releases()?
            .into_iter()
            .map(|name| ReleaseEntry {
                path: self.root.release_dir(&name),
                current: current.as_ref() == Some(&name),
                pending: pending.as_ref() == Some(&name),
                name: name.to_string(),
            })
            .collect())
    }
}

/// `K=v` assignments for the install command, in key order.
fn render_env_vars(config: &DeployConfig) -> String {
    config
        .env_vars
        .iter()
        .map(|(key, value)| format!("{}={}", key, shell_quote(value)))
        .collect::<Vec<_>>()
        .join(" ")
}
