//! # Deploy Command Implementation
//!
//! Runs the full pipeline: prepare the deploy root, allocate a release,
//! clone the repository into it, run the install command, point `current`
//! at the new release and prune old releases.
//!
//! A failing stage stops the deploy. `current` is only touched by the
//! activate stage, so a failure before it leaves the live release as it was.

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::Deployer;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::{GlobalOptions, RetentionArgs, SourceArgs};

/// Arguments for the deploy command
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub retention: RetentionArgs,
}

/// Execute the deploy command
pub fn execute(args: DeployArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config_with(global, Some(&args.source), Some(&args.retention))?;
    // Fail before touching the deploy root
    let repository = config
        .require_repository()
        .map_err(suggestions::explain)?
        .to_string();

    println!(
        "{} Deploying {} to {}",
        out.mark(Mark::Step),
        repository,
        config.deploy_path.display()
    );

    let mut deployer = Deployer::new(config);
    let report = match deployer.run() {
        Ok(report) => report,
        Err(e) => {
            println!("{} Deploy failed", out.mark(Mark::Err));
            return Err(suggestions::explain(e));
        }
    };

    println!(
        "{} Release {} is live ({})",
        out.mark(Mark::Ok),
        out.highlight(&report.release),
        report.strategy
    );
    if report.installed {
        println!("   Install command completed");
    }
    if !report.cleanup.removed.is_empty() {
        println!(
            "{} Removed {} old release(s)",
            out.mark(Mark::Removed),
            report.cleanup.removed.len()
        );
        for name in &report.cleanup.removed {
            println!("   {}", name);
        }
    }
    Ok(())
}
