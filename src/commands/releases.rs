//! # Releases Command Implementation
//!
//! Lists the releases of the deploy root, most recent first, marking the
//! one `current` points at and the pending one. `--json` prints the same
//! data for scripts.

use anyhow::Result;
use clap::Args;

use deploy_local::deploy::{Deployer, ReleaseEntry};
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::suggestions;

use super::GlobalOptions;

/// Arguments for the releases command
#[derive(Args, Debug, Default)]
pub struct ReleasesArgs {
    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the releases command
pub fn execute(args: ReleasesArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);
    let config = super::load_config(global)?;
    let deployer = Deployer::new(config);
    let entries = deployer.releases().map_err(suggestions::explain)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "{} No releases under {}",
            out.mark(Mark::Info),
            deployer.root().path().display()
        );
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(&out, entry));
    }
    Ok(())
}

fn format_entry(out: &OutputConfig, entry: &ReleaseEntry) -> String {
    let marker = match (entry.current, entry.pending) {
        (true, _) => "current",
        (false, true) => "pending",
        (false, false) => "",
    };
    if marker.is_empty() {
        format!("  {}", entry.name)
    } else {
        format!("* {} ({})", out.highlight(&entry.name), marker)
    }
}
