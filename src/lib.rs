//! # Local Release Manager
//!
//! This library manages a local deploy root made of timestamped release
//! directories, a transient `release` link and a persistent `current` link.
//! It is used by the `deploy-local` command-line tool but can also drive
//! deploys from other programs through [`deploy::Deployer`].
//!
//! ## Quick Example
//!
//! ```
//! use chrono::NaiveDate;
//! use deploy_local::layout::DeployRoot;
//! use deploy_local::release::{self, FixedClock};
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let root = DeployRoot::new(temp.path());
//! root.prepare().unwrap();
//!
//! let noon = NaiveDate::from_ymd_opt(2024, 1, 1)
//!     .unwrap()
//!     .and_hms_opt(12, 0, 0)
//!     .unwrap();
//! let clock = FixedClock::at_local(noon).unwrap();
//!
//! // Two releases in the same second get distinct names
//! let first = release::allocate(&root, &clock).unwrap();
//! let second = release::allocate(&root, &clock).unwrap();
//! assert_eq!(first.name.as_str(), "20240101120000");
//! assert_eq!(second.name.as_str(), "20240101120000.1");
//! assert_eq!(root.pending_release().unwrap(), Some(second.name));
//! ```
//!
//! ## Core Concepts
//!
//! - **Layout (`layout`)**: Paths of the deploy root and helpers to read the
//!   `release` and `current` links.
//! - **Releases (`release`)**: Release names and collision-free allocation.
//! - **Checkout (`git`, `checkout`)**: Git version detection and clones that
//!   reuse the previous release as an object cache.
//! - **Activation (`activation`)**: Atomic swap of `current`.
//! - **Retention (`retention`)**: Pruning of old releases.
//! - **Commands (`command`)**: Shell execution with a timeout, behind the
//!   [`command::CommandRunner`] trait so it can be replaced in tests.
//! - **Configuration (`config`, `vars`, `template`)**: The YAML config, the
//!   per-run variable store and `{{name}}` rendering.
//!
//! ## Execution Flow
//!
//! A full deploy runs these stages in order:
//!
//! 1.  **Prepare**: Create `releases/` and `shared/`.
//! 2.  **Release**: Allocate `releases/<YYYYMMDDHHMMSS>[.n]`.
//! 3.  **Checkout**: Clone the repository into the new release.
//! 4.  **Install**: Run the configured install command, if any.
//! 5.  **Activate**: Point `current` at the new release.
//! 6.  **Cleanup**: Delete releases beyond the retention count.

pub mod activation;
pub mod checkout;
pub mod command;
pub mod config;
pub mod defaults;
pub mod deploy;
pub mod error;
pub mod git;
pub mod layout;
pub mod output;
pub mod release;
pub mod retention;
pub mod suggestions;
pub mod template;
pub mod vars;
