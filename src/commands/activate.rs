//! # Activate Command Implementation
//!
//! Points `current` at the pending release in a single rename, then removes
//! the pending `release` link.

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::GlobalOptions;

/// Arguments for the activate command
#[derive(Args, Debug, Default)]
pub struct ActivateArgs {}

/// Execute the activate command
pub fn execute(_args: ActivateArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config(global)?;

    let mut deployer = Deployer::new(config);
    let name = deployer.activate().map_err(suggestions::explain)?;

    println!("{} Activated release {}", out.mark(Mark::Ok), out.highlight(&name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_activate_swaps_current() {
        let temp = TempDir::new().unwrap();
        let global = global_for(&temp, "");
        make_releases(&temp, &["20240101000000", "20240102000000"]);
        point(&temp, "current", "20240101000000");
        point(&temp, "release", "20240102000000");

        execute(ActivateArgs::default(), &global).unwrap();

        let current = std::fs::read_link(deploy_dir(&temp).join("current")).unwrap();
        assert_eq!(current, std::path::Path::new("releases/20240102000000"));
        assert!(std::fs::symlink_metadata(deploy_dir(&temp).join("release")).is_err());
    }

    #[test]
    #[serial]
    fn test_activate_without_pending_release_fails() {
        let temp = TempDir::new().unwrap();
        let global = global_for(&temp, "");
        make_releases(&temp, &["20240101000000"]);

        let err = execute(ActivateArgs::default(), &global).unwrap_err();

        assert!(err.to_string().contains("no release in progress"));
    }
}
