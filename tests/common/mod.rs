//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config("keep_releases: 2\n");
//!     fixture.command().arg("prepare").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::GitSource;
    pub use super::TestFixture;
}

/// A temporary working directory with a `.deploy-local.yaml` whose
/// `deploy_path` is `<temp>/deploy`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a fixture with a config holding only `deploy_path`.
    pub fn new() -> Self {
        let fixture = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        fixture.write_config("");
        fixture
    }

    /// Replace the config with `deploy_path` plus `extra` YAML.
    pub fn with_config(self, extra: &str) -> Self {
        self.write_config(extra);
        self
    }

    fn write_config(&self, extra: &str) {
        self.temp_dir
            .child(".deploy-local.yaml")
            .write_str(&format!(
                "deploy_path: {}\n{}",
                self.deploy_path().display(),
                extra
            ))
            .expect("Failed to write config file");
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The deploy root the config points at.
    pub fn deploy_path(&self) -> PathBuf {
        self.temp_dir.path().join("deploy")
    }

    /// `deploy/releases/<name>`
    #[allow(dead_code)]
    pub fn release_dir(&self, name: &str) -> PathBuf {
        self.deploy_path().join("releases").join(name)
    }

    /// Create release directories by hand.
    #[allow(dead_code)]
    pub fn with_releases(self, names: &[&str]) -> Self {
        for name in names {
            std::fs::create_dir_all(self.release_dir(name)).expect("Failed to create release");
        }
        self
    }

    /// Point `link` (`current` or `release`) at `releases/<name>`.
    #[allow(dead_code)]
    pub fn with_link(self, link: &str, name: &str) -> Self {
        std::os::unix::fs::symlink(
            Path::new("releases").join(name),
            self.deploy_path().join(link),
        )
        .expect("Failed to create link");
        self
    }

    /// Target of `link`, if it is a symlink.
    #[allow(dead_code)]
    pub fn read_link(&self, link: &str) -> Option<PathBuf> {
        std::fs::read_link(self.deploy_path().join(link)).ok()
    }

    /// Release directory names on disk, sorted.
    #[allow(dead_code)]
    pub fn releases_on_disk(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.deploy_path().join("releases"))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Create a command running in this fixture's directory, with colour off
    /// and no `DEPLOY_LOCAL_*` overrides leaking in from the environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-local");
        cmd.current_dir(self.path()).arg("--color").arg("never");
        for (key, _) in std::env::vars() {
            if key.starts_with("DEPLOY_LOCAL_") {
                cmd.env_remove(key);
            }
        }
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A local git repository with one commit on `main` and a `v1.0.0` tag.
#[allow(dead_code)]
pub struct GitSource {
    dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl GitSource {
    pub fn new() -> Self {
        let dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let source = Self { dir };
        source.git(&["init", "-q"]);
        source.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        source.git(&["config", "user.email", "deploy@example.com"]);
        source.git(&["config", "user.name", "Deploy Test"]);
        source.commit("index.php", "<?php echo 'v1';", "first");
        source.git(&["tag", "v1.0.0"]);
        source
    }

    /// Write `file` and commit it.
    pub fn commit(&self, file: &str, content: &str, message: &str) {
        self.dir
            .child(file)
            .write_str(content)
            .expect("Failed to write file");
        self.git(&["add", file]);
        self.git(&["commit", "-q", "-m", message]);
    }

    /// `file://` URL of the repository.
    pub fn url(&self) -> String {
        format!("file://{}", self.dir.path().display())
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    }
}
