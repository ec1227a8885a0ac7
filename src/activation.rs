//! # Activation
//!
//! Promotes a prepared release by pointing `current` at it. The new link is
//! created under a temporary name next to `current` and renamed over it, so
//! `current` is replaced by a single `rename(2)`: a concurrent reader sees
//! either the old release or the new one, never a missing link.
//!
//! Once `current` is swapped the pending `release` link is removed. A failure
//! there is only logged; the next cleanup removes the stray link.

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::layout::{self, DeployRoot, EntryKind};
use crate::release::ReleaseName;

/// Point `current` at `release_path` and drop the pending link.
///
/// `release_path` must be an existing directory directly under
/// `root/releases`. If the swap fails, the previous `current` is untouched.
pub fn activate(root: &DeployRoot, release_path: &Path) -> Result<ReleaseName> {
    let name = release_under_root(root, release_path)?;

    swap_current(root, &name)?;
    info!("Activated release {}", name);

    remove_pending_link(root);
    Ok(name)
}

/// Validate that `release_path` is a release of `root` and return its name.
fn release_under_root(root: &DeployRoot, release_path: &Path) -> Result<ReleaseName> {
    let invalid = |reason: &str| {
        Error::filesystem(
            "activate",
            release_path,
            io::Error::new(io::ErrorKind::InvalidInput, reason.to_string()),
        )
    };

    let parent_ok = release_path.parent().is_some_and(|p| p == root.releases_dir());
    let name = release_path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|_| parent_ok)
        .map(ReleaseName::new)
        .ok_or_else(|| invalid("not a release directory of this deploy root"))?;

    if !release_path.is_dir() {
        return Err(invalid("release directory does not exist"));
    }
    Ok(name)
}

/// Replace `current` with a link to `name` in one rename.
fn swap_current(root: &DeployRoot, name: &ReleaseName) -> Result<()> {
    let current = root.current_link();
    let staging = root
        .path()
        .join(format!(".{}.tmp-{}", layout::CURRENT_LINK, std::process::id()));

    // A leftover from an interrupted run would make symlink() fail.
    layout::remove_link_or_file(&staging)?;
    layout::symlink(&DeployRoot::link_target(name), &staging)
        .map_err(|e| Error::filesystem("create link", &staging, e))?;

    if let Err(e) = fs::rename(&staging, &current) {
        let _ = fs::remove_file(&staging);
        return Err(Error::filesystem("replace link", &current, e));
    }
    debug!("{} -> {}", current.display(), DeployRoot::link_target(name).display());
    Ok(())
}

fn remove_pending_link(root: &DeployRoot) {
    let link = root.release_link();
    match layout::entry_kind(&link) {
        Ok(EntryKind::Missing) => debug!("no pending link to remove"),
        Ok(_) => {
            if let Err(e) = layout::remove_link_or_file(&link) {
                warn!("Could not remove pending link {}: {}", link.display(), e);
            }
        }
        Err(e) => warn!("Could not inspect pending link {}: {}", link.display(), e),
    }
}
