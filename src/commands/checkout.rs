//! # Checkout Command Implementation
//!
//! Clones the repository into the pending release. With git 2.3 or newer the
//! previous release serves as an object cache; older git gets a shallow
//! clone.

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::{GlobalOptions, SourceArgs};

/// Arguments for the checkout command
#[derive(Args, Debug, Default)]
pub struct CheckoutArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Execute the checkout command
pub fn execute(args: CheckoutArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config_with(global, Some(&args.source), None)?;

    let mut deployer = Deployer::new(config);
    let strategy = deployer.update_code().map_err(suggestions::explain)?;
    let release_path = deployer.release_path().map_err(suggestions::explain)?;

    println!(
        "{} Checked out into {} ({})",
        out.mark(Mark::Ok),
        release_path.display(),
        strategy
    );
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
    fn test_checkout_without_pending_release_fails() {
        let temp = TempDir::new().unwrap();
        let global = global_for(
            &temp,
            "repository: https://example.com/app.git\ngit_cache: false\nbin:\n  git: git\n",
        );

        let err = execute(CheckoutArgs::default(), &global).unwrap_err();

        assert!(err.to_string().contains("no release in progress"));
    }
}
