//! # Validate Command Implementation
//!
//! Checks that a deploy could start without touching the deploy root:
//!
//! - **Configuration**: the config file parses and the environment
//!   overrides are valid.
//! - **Repository**: `repository` is set.
//! - **Install template**: every `{{name}}` in `install` is a variable the
//!   deploy will provide.
//! - **Git**: the git executable is found, and its version decides whether
//!   reference clones will be used.
//!
//! This command is read-only.

use anyhow::Result;
use clap::Args;

use deploy_local::command::ShellRunner;
use deploy_local::config::DeployConfig;
use deploy_local::git;
use deploy_local::output::{Mark, OutputConfig};
use deploy_local::template;
use deploy_local::vars::names;

use super::GlobalOptions;

/// Arguments for the validate command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Skip locating git and checking its version
    #[arg(long)]
    pub skip_git: bool,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs, global: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&global.color);

    let config = match super::load_config(global) {
        Ok(config) => {
            println!("{} Configuration loaded", out.mark(Mark::Ok));
            config
        }
        Err(e) => {
            println!("{} Configuration invalid", out.mark(Mark::Err));
            return Err(e);
        }
    };
    print_summary(&config);

    let mut problems = check_config(&config);

    if !args.skip_git {
        match check_git(&config) {
            Ok(line) => println!("{} {}", out.mark(Mark::Ok), line),
            Err(e) => problems.push(e.to_string()),
        }
    }

    if problems.is_empty() {
        println!("{} Ready to deploy", out.mark(Mark::Ok));
        return Ok(());
    }
    for problem in &problems {
        println!("{} {}", out.mark(Mark::Err), problem);
    }
    anyhow::bail!("Validation failed with {} problem(s)", problems.len())
}

fn print_summary(config: &DeployConfig) {
    println!("   Deploy path: {}", config.deploy_path.display());
    println!(
        "   Repository: {}",
        config.repository.as_deref().unwrap_or("(not set)")
    );
    println!(
        "   Ref: {}",
        git::GitRef::resolve(config.tag.as_deref(), config.branch.as_deref())
    );
    println!("   Keep releases: {}", config.keep_releases);
    println!("   Timeout: {}s", config.timeout);
}

/// Problems a deploy would run into, as messages
fn check_config(config: &DeployConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if let Err(e) = config.require_repository() {
        problems.push(e.to_string());
    }

    if let Some(install) = &config.install {
        match template::placeholders(install) {
            Ok(found) => {
                for name in found {
                    if !names::INSTALL.contains(&name.as_str()) {
                        problems.push(format!(
                            "install uses unknown variable '{{{{{}}}}}'; available: {}",
                            name,
                            names::INSTALL.join(", ")
                        ));
                    }
                }
            }
            Err(e) => problems.push(e.to_string()),
        }
    }

    problems
}

fn check_git(config: &DeployConfig) -> deploy_local::error::Result<String> {
    let git_bin = match &config.bin.git {
        Some(path) => path.clone(),
        None => git::find_git_binary()?,
    };
    let version = git::detect_version(&ShellRunner::new(), &git_bin, config.timeout())?;
    let cache = match config.git_cache {
        Some(true) => "reference clones forced on",
        Some(false) => "reference clones forced off",
        None if git::supports_reference_cache(&version) => "reference clones enabled",
        None => "shallow clones (git older than 2.3)",
    };
    Ok(format!("git {} at {} ({})", version, git_bin.display(), cache))
}
