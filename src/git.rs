use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use regex::Regex;
use semver::Version;

use crate::command::{shell_quote, CommandRunner};
use crate::error::{Error, Result};

/// Oldest git that understands `clone --reference ... --dissociate`.
pub const MIN_CACHE_VERSION: Version = Version::new(2, 3, 0);

/// Version assumed when `git version` output can't be parsed.
pub const FALLBACK_VERSION: Version = Version::new(1, 0, 0);

/// Which ref of the repository to check out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitRef {
    Tag(String),
    Branch(String),
    /// The repository's default branch
    Default,
}

impl GitRef {
    /// A non-empty tag wins over a non-empty branch; with neither, the
    /// default branch is cloned.
    pub fn resolve(tag: Option<&str>, branch: Option<&str>) -> Self {
        let non_empty = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        if let Some(tag) = non_empty(tag) {
            GitRef::Tag(tag)
        } else if let Some(branch) = non_empty(branch) {
            GitRef::Branch(branch)
        } else {
            GitRef::Default
        }
    }

    /// Value passed to `git clone -b`, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            GitRef::Tag(name) | GitRef::Branch(name) => Some(name),
            GitRef::Default => None,
        }
    }
}

impl std::fmt::Display for GitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name().unwrap_or("HEAD"))
    }
}

/// Locate `git` on `PATH`
pub fn find_git_binary() -> Result<PathBuf> {
    which::which("git").map_err(|e| Error::Config {
        message: format!("git executable not found: {}", e),
        hint: Some("Install git or set 'bin.git' in the configuration".to_string()),
    })
}

/// Parse the version out of `git version` output.
///
/// Takes the first dotted run of digits (`git version 2.39.3 (Apple Git-146)`
/// gives 2.39.3). Missing minor/patch components count as zero, components
/// past the third are ignored, and output without any digits yields
/// [`FALLBACK_VERSION`].
pub fn parse_git_version(output: &str) -> Result<Version> {
    let regex = Regex::new(r"((\d+\.?)+)")?;
    let Some(caps) = regex.captures(output) else {
        return Ok(FALLBACK_VERSION);
    };

    let mut parts = caps[1]
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>().unwrap_or(u64::MAX));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    Ok(Version::new(major, minor, patch))
}

/// Whether `version` supports reference clones with `--dissociate`.
pub fn supports_reference_cache(version: &Version) -> bool {
    *version >= MIN_CACHE_VERSION
}

/// Ask the installed git for its version
pub fn detect_version(runner: &dyn CommandRunner, git_bin: &Path, timeout: Duration) -> Result<Version> {
    let command = format!("{} version", shell_quote(&git_bin.to_string_lossy()));
    let output = runner.run(&command, timeout)?;
    let version = parse_git_version(output.trimmed())?;
    debug!("detected git {}", version);
    Ok(version)
}

/// A single `git clone` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneCommand<'a> {
    pub git_bin: &'a Path,
    pub repository: &'a str,
    pub git_ref: &'a GitRef,
    pub destination: &'a Path,
    /// Local repository to borrow objects from (`--reference ... --dissociate`)
    pub reference: Option<&'a Path>,
    /// Clone with `--depth 1`
    pub shallow: bool,
}

impl CloneCommand<'_> {
    /// Shell command line, with stderr folded into stdout.
    pub fn render(&self) -> String {
        let mut parts = vec![shell_quote(&self.git_bin.to_string_lossy()), "clone".to_string()];
        if let Some(name) = self.git_ref.name() {
            parts.push("-b".to_string());
            parts.push(shell_quote(name));
        }
        if self.shallow {
            parts.push("--depth 1".to_string());
        }
        parts.push("--recursive".to_string());
        parts.push("-q".to_string());
        if let Some(reference) = self.reference {
            parts.push("--reference".to_string());
            parts.push(shell_quote(&reference.to_string_lossy()));
            parts.push("--dissociate".to_string());
        }
        parts.push(shell_quote(self.repository));
        parts.push(shell_quote(&self.destination.to_string_lossy()));
        parts.push("2>&1".to_string());
        parts.join(" ")
    }
}

/// Hint for clone failures that look like missing credentials
pub fn auth_hint(output: &str) -> Option<String> {
    let looks_like_auth = output.contains("Authentication failed")
        || output.contains("Permission denied")
        || output.contains("Could not read from remote repository");
    looks_like_auth.then(|| {
        "Make sure you have access to the repository: add your SSH key to ssh-agent, \
         or configure git credentials or a personal access token"
            .to_string()
    })
}
