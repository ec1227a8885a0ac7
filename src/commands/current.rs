//! Current command implementation

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::suggestions;

use super::GlobalOptions;

/// Arguments for the current command
#[derive(Args, Debug, Default)]
pub struct CurrentArgs {}

/// Execute the current command
///
/// Prints the name only, without marks, so scripts can parse it.
pub fn execute(_args: CurrentArgs, global: &GlobalOptions) -> Result<()> {
    let config = super::load_config(global)?;
    let deployer = Deployer::new(config);

    match deployer.current().map_err(suggestions::explain)? {
        Some(name) => println!("Current local release: {}", name),
        None => println!(
            "No current release under {}",
            deployer.root().path().display()
        ),
    }
    Ok(())
}
