//! # Deploy Root Layout
//!
//! A deploy root is a directory with this shape:
//!
//! ```text
//! <deploy_root>/
//!   releases/
//!     <YYYYMMDDHHMMSS>[.<n>]/
//!   shared/
//!   release -> releases/<pending>      (transient, during a run)
//!   current -> releases/<active>       (persistent, atomic swap)
//! ```
//!
//! [`DeployRoot`] owns the paths of these entries and the filesystem helpers
//! the other stages share: preparing the directories, reading and replacing
//! links, and listing releases.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::release::ReleaseName;

pub const RELEASES_DIR: &str = "releases";
pub const SHARED_DIR: &str = "shared";
pub const RELEASE_LINK: &str = "release";
pub const CURRENT_LINK: &str = "current";

/// Paths of a deploy root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRoot {
    path: PathBuf,
}

impl DeployRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn releases_dir(&self) -> PathBuf {
        self.path.join(RELEASES_DIR)
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.path.join(SHARED_DIR)
    }

    pub fn release_link(&self) -> PathBuf {
        self.path.join(RELEASE_LINK)
    }

    pub fn current_link(&self) -> PathBuf {
        self.path.join(CURRENT_LINK)
    }

    /// Absolute path of the directory of release `name`.
    pub fn release_dir(&self, name: &ReleaseName) -> PathBuf {
        self.releases_dir().join(name.as_str())
    }

    /// Link target for release `name`, relative to the deploy root.
    pub fn link_target(name: &ReleaseName) -> PathBuf {
        Path::new(RELEASES_DIR).join(name.as_str())
    }

    /// Ensure the deploy root, `releases/` and `shared/` exist.
    ///
    /// Idempotent: existing directories are left as they are.
    pub fn prepare(&self) -> Result<()> {
        for dir in [self.path.clone(), self.releases_dir(), self.shared_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|e| Error::filesystem("create directory", &dir, e))?;
        }
        debug!("deploy root ready at {}", self.path.display());
        Ok(())
    }

    /// Release names under `releases/`, most recent first.
    ///
    /// Only directories count; a missing `releases/` yields an empty list.
    pub fn list_releases(&self) -> Result<Vec<ReleaseName>> {
        let dir = self.releases_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::filesystem("list releases in", &dir, e)),
        };

        let mut releases = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::filesystem("list releases in", &dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| Error::filesystem("inspect", entry.path(), e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                releases.push(ReleaseName::new(name));
            }
        }

        sort_most_recent_first(&mut releases);
        Ok(releases)
    }

    /// Release a link under the deploy root points at, if the link exists.
    ///
    /// Works for absolute and relative targets; the release is the last
    /// component of the target.
    pub fn read_link_release(&self, link: &Path) -> Result<Option<ReleaseName>> {
        match fs::read_link(link) {
            Ok(target) => Ok(target
                .file_name()
                .and_then(|n| n.to_str())
                .map(ReleaseName::new)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Not a symlink at all (plain file or directory)
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(None),
            Err(e) => Err(Error::filesystem("read link", link, e)),
        }
    }

    /// Release `current` points at.
    pub fn current_release(&self) -> Result<Option<ReleaseName>> {
        self.read_link_release(&self.current_link())
    }

    /// Release the pending `release` link points at.
    pub fn pending_release(&self) -> Result<Option<ReleaseName>> {
        self.read_link_release(&self.release_link())
    }
}

/// Sort release names descending, i.e. most recent first. Timestamps
/// compare as text and collision suffixes numerically, so `.10` follows `.9`.
pub fn sort_most_recent_first(releases: &mut [ReleaseName]) {
    releases.sort_by(|a, b| b.cmp(a));
}

/// What occupies a path, without following a final symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    Symlink,
    File,
    Directory,
}

pub fn entry_kind(path: &Path) -> Result<EntryKind> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let ft = meta.file_type();
            Ok(if ft.is_symlink() {
                EntryKind::Symlink
            } else if ft.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
        Err(e) => Err(Error::filesystem("inspect", path, e)),
    }
}

/// Remove a symlink or plain file at `path`; a missing entry is fine.
///
/// Returns whether something was removed. Directories are refused.
pub fn remove_link_or_file(path: &Path) -> Result<bool> {
    match entry_kind(path)? {
        EntryKind::Missing => Ok(false),
        EntryKind::Symlink | EntryKind::File => {
            fs::remove_file(path).map_err(|e| Error::filesystem("remove", path, e))?;
            Ok(true)
        }
        EntryKind::Directory => Err(Error::filesystem(
            "remove",
            path,
            io::Error::new(io::ErrorKind::Other, "is a directory, not a link"),
        )),
    }
}

#[cfg(unix)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_layout() {
        let temp = TempDir::new().unwrap();
        let root = DeployRoot::new(temp.path().join("deploy"));

        root.prepare().unwrap();

        assert!(root.path().is_dir());
        assert!(root.releases_dir().is_dir());
        assert!(root.shared_dir().is_dir());
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let root = DeployRoot::new(temp.path());
        root.prepare().unwrap();
        fs::write(root.shared_dir().join(".env"), "APP_ENV=prod").unwrap();

        root.prepare().unwrap();

        assert_eq!(
            fs::read_to_string(root.shared_dir().join(".env")).unwrap(),
            "APP_ENV=prod"
        );
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_prepare_fails_when_root_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        let err = DeployRoot::new(&file).prepare().unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }

    #[test]
    fn test_list_releases_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let root = DeployRoot::new(temp.path());
        assert!(root.list_releases().unwrap().is_empty());
    }

    #[test]
    fn test_list_releases_sorted_descending_and_dirs_only() {
        let temp = TempDir::new().unwrap();
        let root = DeployRoot::new(temp.path());
        root.prepare().unwrap();
        for name in ["20240101000000", "20240102000000.1", "20240102000000"] {
            fs::create_dir(root.releases_dir().join(name)).unwrap();
        }
        fs::write(root.releases_dir().join("README"), "stray file").unwrap();

        let names: Vec<String> = root
            .list_releases()
            .unwrap()
            .into_iter()
            .map(|r| r.to_string())
            .collect();

        assert_eq!(names, vec!["20240102000000.1", "20240102000000", "20240101000000"]);
    }

    #[test]
    fn test_sort_matches_chronological_order() {
        let mut names: Vec<ReleaseName> = ["20240101000000", "20240102000000", "20240102000000.1"]
            .into_iter()
            .map(ReleaseName::new)
            .collect();
        sort_most_recent_first(&mut names);
        let sorted: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(sorted, vec!["20240102000000.1", "20240102000000", "20240101000000"]);
    }

    #[test]
    fn test_read_link_release_relative_and_missing() {
        let temp = TempDir::new().unwrap();
        let root = DeployRoot::new(temp.path());
        root.prepare().unwrap();
        assert_eq!(root.current_release().unwrap(), None);

        let name = ReleaseName::new("20240101000000");
        fs::create_dir(root.release_dir(&name)).unwrap();
        symlink(&DeployRoot::link_target(&name), &root.current_link()).unwrap();

        assert_eq!(root.current_release().unwrap(), Some(name));
    }

    #[test]
    fn test_read_link_release_on_plain_file_is_none() {
        let temp = TempDir::new().unwrap();
        let root = DeployRoot::new(temp.path());
        fs::write(root.release_link(), "garbage").unwrap();
        assert_eq!(root.pending_release().unwrap(), None);
    }

    #[test]
    fn test_remove_link_or_file_handles_each_kind() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        let dangling = temp.path().join("dangling");
        let dir = temp.path().join("dir");
        fs::write(&file, "x").unwrap();
        symlink(Path::new("does/not/exist"), &dangling).unwrap();
        fs::create_dir(&dir).unwrap();

        assert!(remove_link_or_file(&file).unwrap());
        assert!(remove_link_or_file(&dangling).unwrap());
        assert!(!remove_link_or_file(&temp.path().join("missing")).unwrap());
        assert!(remove_link_or_file(&dir).is_err());
        assert_eq!(entry_kind(&dangling).unwrap(), EntryKind::Missing);
        assert_eq!(entry_kind(&dir).unwrap(), EntryKind::Directory);
    }
}
