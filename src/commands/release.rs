//! # Release Command Implementation
//!
//! Allocates the next release directory, named after the current local
//! time, and points the pending `release` link at it.

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::GlobalOptions;

/// Arguments for the release command
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {}

/// Execute the release command
pub fn execute(_args: ReleaseArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config(global)?;

    let mut deployer = Deployer::new(config);
    let allocated = deployer.release().map_err(suggestions::explain)?;

    println!(
        "{} Allocated release {}",
        out.mark(Mark::Ok),
        out.highlight(&allocated.name)
    );
    println!("   {}", allocated.path.display());
    Ok(())
}
