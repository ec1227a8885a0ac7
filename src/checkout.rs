//! # Checkout Engine
//!
//! Clones the repository into a freshly allocated release directory.
//!
//! When the installed git supports `--dissociate` and an older release
//! exists, the clone borrows objects from that release's `.git` with
//! `--reference`, then dissociates so the new release stands on its own. A
//! repository that is re-deployed often only downloads what changed.
//!
//! The reference is not checked up front. If the reference clone fails for
//! any reason (shallow or pruned reference, half-written release, timeout),
//! exactly one plain full clone is attempted before the error is surfaced.
//! Without git-cache support the clone is shallow.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::git::{self, CloneCommand, GitRef};
use crate::layout::DeployRoot;
use crate::release::ReleaseName;

/// Everything needed to check one release out
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub git_bin: PathBuf,
    pub repository: String,
    pub git_ref: GitRef,
    pub destination: PathBuf,
    /// Prior release `.git` to use as an object cache
    pub reference: Option<PathBuf>,
    /// Whether git-cache clones are enabled (git >= 2.3 or forced by config)
    pub git_cache: bool,
    pub timeout: Duration,
}

/// How the release was finally cloned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStrategy {
    /// `--reference <prior release> --dissociate` succeeded
    Reference,
    /// The reference clone failed and the full clone after it succeeded
    Fallback,
    /// Full clone without a reference (git cache on, no prior release)
    Full,
    /// `--depth 1` clone (git cache off)
    Shallow,
}

impl fmt::Display for CheckoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CheckoutStrategy::Reference => "reference clone",
            CheckoutStrategy::Fallback => "full clone after failed reference clone",
            CheckoutStrategy::Full => "full clone",
            CheckoutStrategy::Shallow => "shallow clone",
        };
        f.write_str(text)
    }
}

/// The object cache for a new release: the `.git` of the second most recent
/// release, given a list that already contains the new release.
///
/// Only the list length matters here; whether that directory really holds a
/// usable repository is found out by the clone itself.
pub fn cache_reference(root: &DeployRoot, releases: &[ReleaseName], git_cache: bool) -> Option<PathBuf> {
    if !git_cache {
        return None;
    }
    releases
        .get(1)
        .map(|previous| root.release_dir(previous).join(".git"))
}

/// Clone `request.repository` into `request.destination`.
///
/// On final failure the destination is left in place for inspection.
pub fn checkout(runner: &dyn CommandRunner, request: &CheckoutRequest) -> Result<CheckoutStrategy> {
    let run_clone = |reference: Option<&Path>, shallow: bool| -> Result<()> {
        let command = CloneCommand {
            git_bin: &request.git_bin,
            repository: &request.repository,
            git_ref: &request.git_ref,
            destination: &request.destination,
            reference,
            shallow,
        };
        runner.run(&command.render(), request.timeout).map(|_| ())
    };

    if request.git_cache {
        if let Some(reference) = request.reference.as_deref() {
            info!(
                "Cloning {}@{} using {} as cache",
                request.repository,
                request.git_ref,
                reference.display()
            );
            match run_clone(Some(reference), false) {
                Ok(()) => return Ok(CheckoutStrategy::Reference),
                Err(e) if e.is_command_failure() => {
                    warn!("Reference clone failed, retrying without cache: {}", e);
                }
                Err(e) => return Err(e),
            }

            reset_destination(&request.destination)?;
            run_clone(None, false).map_err(|e| clone_error(request, e))?;
            return Ok(CheckoutStrategy::Fallback);
        }
    }

    let shallow = !request.git_cache;
    info!(
        "Cloning {}@{}{}",
        request.repository,
        request.git_ref,
        if shallow { " (shallow)" } else { "" }
    );
    run_clone(None, shallow).map_err(|e| clone_error(request, e))?;

    Ok(if shallow {
        CheckoutStrategy::Shallow
    } else {
        CheckoutStrategy::Full
    })
}

/// Empty the destination so git will clone into it again. The directory
/// itself stays because the pending link points at it.
fn reset_destination(destination: &Path) -> Result<()> {
    let entries = match fs::read_dir(destination) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return fs::create_dir_all(destination)
                .map_err(|e| Error::filesystem("create release directory", destination, e));
        }
        Err(e) => return Err(Error::filesystem("read", destination, e)),
    };

    for entry in entries {
        let path = entry
            .map_err(|e| Error::filesystem("read", destination, e))?
            .path();
        let result = if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| Error::filesystem("remove", &path, e))?;
    }
    Ok(())
}

fn clone_error(request: &CheckoutRequest, err: Error) -> Error {
    if !err.is_command_failure() {
        return err;
    }
    let message = err.to_string();
    Error::GitClone {
        url: request.repository.clone(),
        r#ref: request.git_ref.to_string(),
        hint: git::auth_hint(&message),
        message,
    }
}
