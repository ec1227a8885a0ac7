//! # Release Allocation
//!
//! A release is named after the local time it was allocated at, with second
//! resolution (`YYYYMMDDHHMMSS`). Two allocations within the same second get
//! suffixed names (`.1` up to `.42`); once those are taken too, allocation
//! fails with [`Error::AllocationExhausted`].
//!
//! Allocation also points the pending `release` link at the new directory.
//! The link is replaced by removing the old entry and creating a new one, so
//! a crash in between leaves no pending link at all. `current` is never
//! touched here, which makes that window harmless.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::layout::{self, DeployRoot};

/// Format of the timestamp part of a release name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Highest collision suffix tried before giving up.
pub const MAX_SUFFIX: u32 = 42;

/// Name of a release directory under `releases/`.
///
/// Names order by timestamp, then by numeric collision suffix, so `.10`
/// sorts after `.9`. For the allocator's fixed-width timestamps that is
/// chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseName(String);

impl Ord for ReleaseName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base()
            .cmp(other.base())
            .then_with(|| self.suffix().cmp(&other.suffix()))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ReleaseName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ReleaseName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    fn with_suffix(base: &str, suffix: u32) -> Self {
        if suffix == 0 {
            Self(base.to_string())
        } else {
            Self(format!("{}.{}", base, suffix))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The timestamp part, without any collision suffix.
    pub fn base(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Collision suffix, if the name carries a numeric one.
    pub fn suffix(&self) -> Option<u32> {
        self.0.split_once('.').and_then(|(_, s)| s.parse().ok())
    }
}

impl fmt::Display for ReleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the allocation time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to one instant, for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    /// Pin the clock to a local wall-clock time.
    ///
    /// Returns `None` for times that don't exist in the local timezone
    /// (skipped by a DST change).
    pub fn at_local(naive: NaiveDateTime) -> Option<Self> {
        Local.from_local_datetime(&naive).earliest().map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// A freshly allocated release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedRelease {
    pub name: ReleaseName,
    /// Absolute path of the release directory
    pub path: PathBuf,
}

/// Pick a free release name for the clock's current second.
///
/// Tries the bare timestamp, then `.1` through `.42`.
pub fn resolve_name(root: &DeployRoot, clock: &dyn Clock) -> Result<ReleaseName> {
    let base = clock.now().format(TIMESTAMP_FORMAT).to_string();

    for suffix in 0..=MAX_SUFFIX {
        let candidate = ReleaseName::with_suffix(&base, suffix);
        let path = root.release_dir(&candidate);
        let taken = fs::symlink_metadata(&path).is_ok();
        if !taken {
            return Ok(candidate);
        }
        debug!("release {} already exists, trying next suffix", candidate);
    }

    Err(Error::AllocationExhausted {
        base,
        attempts: MAX_SUFFIX + 1,
    })
}

/// Allocate a new release directory and point `release` at it.
pub fn allocate(root: &DeployRoot, clock: &dyn Clock) -> Result<AllocatedRelease> {
    let name = resolve_name(root, clock)?;
    let path = root.release_dir(&name);

    fs::create_dir_all(&path).map_err(|e| Error::filesystem("create release directory", &path, e))?;

    let link = root.release_link();
    layout::remove_link_or_file(&link)?;
    layout::symlink(&DeployRoot::link_target(&name), &link)
        .map_err(|e| Error::filesystem("create pending link", &link, e))?;

    info!("Allocated release {}", name);
    Ok(AllocatedRelease { name, path })
}
