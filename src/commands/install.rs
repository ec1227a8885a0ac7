//! Install command implementation

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::GlobalOptions;

/// Arguments for the install command
#[derive(Args, Debug, Default)]
pub struct InstallArgs {}

/// Execute the install command
pub fn execute(_args: InstallArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config(global)?;

    let mut deployer = Deployer::new(config);
    if deployer.install().map_err(suggestions::explain)? {
        println!("{} Install command completed", out.mark(Mark::Ok));
    } else {
        println!(
            "{} No install command configured, nothing to do",
            out.mark(Mark::Info)
        );
    }
    Ok(())
}
