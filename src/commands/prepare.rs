//! # Prepare Command Implementation
//!
//! Creates the deploy root with its `releases/` and `shared/` directories.
//! Running it again on a prepared root changes nothing.

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::GlobalOptions;

/// Arguments for the prepare command
#[derive(Args, Debug, Default)]
pub struct PrepareArgs {}

/// Execute the prepare command
pub fn execute(_args: PrepareArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config(global)?;

    let mut deployer = Deployer::new(config);
    deployer.prepare().map_err(suggestions::explain)?;

    println!(
        "{} Deploy root ready: {}",
        out.mark(Mark::Ok),
        deployer.root().path().display()
    );
    Ok(())
}
