//! # Retention
//!
//! Prunes old releases. The `keep` most recent releases survive and every
//! older one is deleted recursively. The release `current` points at is
//! never deleted, even when it falls outside the window.
//!
//! Cleanup also removes a pending `release` link left by a run that never
//! reached activation, whatever shape it was left in (symlink, dangling
//! symlink or plain file).

use std::fs;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::layout::{self, DeployRoot, EntryKind};
use crate::release::ReleaseName;

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Releases still on disk, most recent first
    pub kept: Vec<ReleaseName>,
    /// Releases deleted, most recent first
    pub removed: Vec<ReleaseName>,
    /// Whether a stray pending link was removed
    pub removed_pending_link: bool,
}

/// Split `releases` (most recent first) into the names to keep and the names
/// to delete. `current` is always kept.
pub fn plan(
    releases: &[ReleaseName],
    keep: usize,
    current: Option<&ReleaseName>,
) -> (Vec<ReleaseName>, Vec<ReleaseName>) {
    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for (index, release) in releases.iter().enumerate() {
        if index < keep || Some(release) == current {
            kept.push(release.clone());
        } else {
            removed.push(release.clone());
        }
    }
    (kept, removed)
}

/// Delete releases beyond the `keep` most recent and any stray pending link.
pub fn cleanup(root: &DeployRoot, keep: usize) -> Result<CleanupReport> {
    let releases = root.list_releases()?;
    let current = root.current_release()?;

    if let Some(current) = &current {
        let in_window = releases.iter().take(keep).any(|r| r == current);
        if !in_window && releases.contains(current) {
            warn!(
                "Current release {} is outside the newest {} releases, keeping it",
                current, keep
            );
        }
    }

    let (kept, removed) = plan(&releases, keep, current.as_ref());
    for release in &removed {
        let path = root.release_dir(release);
        fs::remove_dir_all(&path).map_err(|e| Error::filesystem("remove release", &path, e))?;
        debug!("removed release {}", release);
    }
    if !removed.is_empty() {
        info!("Removed {} old release(s)", removed.len());
    }

    let link = root.release_link();
    let removed_pending_link = match layout::entry_kind(&link)? {
        EntryKind::Directory => {
            warn!("{} is a directory, leaving it alone", link.display());
            false
        }
        _ => layout::remove_link_or_file(&link)?,
    };
    if removed_pending_link {
        info!("Removed stale pending link");
    }

    Ok(CleanupReport {
        kept,
        removed,
        removed_pending_link,
    })
}
