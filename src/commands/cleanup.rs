//! # Cleanup Command Implementation
//!
//! Deletes releases beyond the retention count, most recent kept first. The
//! release `current` points at survives regardless. A stray pending
//! `release` link from an interrupted run is removed as well.

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::{GlobalOptions, RetentionArgs};

/// Arguments for the cleanup command
#[derive(Args, Debug, Default)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub retention: RetentionArgs,
}

/// Execute the cleanup command
pub fn execute(args: CleanupArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config_with(global, None, Some(&args.retention))?;
    let keep = config.keep_releases;

    let mut deployer = Deployer::new(config);
    let report = deployer.cleanup().map_err(suggestions::explain)?;

    if report.removed.is_empty() {
        println!(
            "{} Nothing to remove ({} release(s), keeping {})",
            out.mark(Mark::Ok),
            report.kept.len(),
            keep
        );
    } else {
        println!(
            "{} Removed {} old release(s)",
            out.mark(Mark::Removed),
            report.removed.len()
        );
        for name in &report.removed {
            println!("   {}", name);
        }
    }
    if report.removed_pending_link {
        println!("{} Removed stale pending link", out.mark(Mark::Warn));
    }
    Ok(())
}
