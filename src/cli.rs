//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, GlobalOptions};

/// deploy-local - Atomic local release directories with git-cache checkout
#[derive(Parser, Debug)]
#[command(name = "deploy-local")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to ./.deploy-local.yaml when present)
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "DEPLOY_LOCAL_CONFIG"
    )]
    config: Option<PathBuf>,

    /// Deploy root, overriding the config file and DEPLOY_LOCAL_PATH
    #[arg(long, global = true, value_name = "DIR")]
    deploy_path: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(
        long,
        global = true,
        value_name = "WHEN",
        default_value = "auto",
        value_parser = ["auto", "always", "never"]
    )]
    color: String,

    /// Set log level (off, error, warn, info, debug, trace); RUST_LOG wins when set
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every stage: prepare, release, checkout, install, activate, cleanup
    Deploy(commands::deploy::DeployArgs),

    /// Create the deploy root with releases/ and shared/
    Prepare(commands::prepare::PrepareArgs),

    /// Allocate a new release directory and point `release` at it
    Release(commands::release::ReleaseArgs),

    /// Clone the repository into the pending release
    Checkout(commands::checkout::CheckoutArgs),

    /// Run the configured install command inside the pending release
    Install(commands::install::InstallArgs),

    /// Point `current` at the pending release
    Activate(commands::activate::ActivateArgs),

    /// Delete releases beyond the retention count
    Cleanup(commands::cleanup::CleanupArgs),

    /// Show the release `current` points at
    Current(commands::current::CurrentArgs),

    /// List releases, most recent first
    Releases(commands::releases::ReleasesArgs),

    /// Check the configuration and git without touching the deploy root
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let global = GlobalOptions {
            config: self.config,
            deploy_path: self.deploy_path,
            color: self.color,
        };

        match self.command {
            Commands::Deploy(args) => commands::deploy::execute(args, &global),
            Commands::Prepare(args) => commands::prepare::execute(args, &global),
            Commands::Release(args) => commands::release::execute(args, &global),
            Commands::Checkout(args) => commands::checkout::execute(args, &global),
            Commands::Install(args) => commands::install::execute(args, &global),
            Commands::Activate(args) => commands::activate::execute(args, &global),
            Commands::Cleanup(args) => commands::cleanup::execute(args, &global),
            Commands::Current(args) => commands::current::execute(args, &global),
            Commands::Releases(args) => commands::releases::execute(args, &global),
            Commands::Validate(args) => commands::validate::execute(args, &global),
        }
    }
}

/// Send library logs to stderr at `level`, unless `RUST_LOG` says otherwise.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when embedded in tests
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
