//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::output::OutputContext;

/// Provision the ViewLink remote-desktop agent over SSH
#[derive(Parser)]
#[command(
    name = "deskpilot",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install the agent on a host and discover its ID
    Install(commands::install::InstallArgs),

    /// Check whether the agent is installed and which ID it has
    Status(commands::status::StatusArgs),

    /// Record a manually read agent ID
    SetId(commands::set_id::SetIdArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli { no_color, quiet, json, command } = self;
        match command {
            Command::Version => commands::version::run(json),
            Command::Install(args) => {
                let ctx = OutputContext::new(no_color, quiet);
                commands::install::run(&ctx, &args, json).await
            }
            Command::Status(args) => {
                let ctx = OutputContext::new(no_color, quiet);
                commands::status::run(&ctx, &args, json).await
            }
            Command::SetId(args) => {
                let ctx = OutputContext::new(no_color, quiet);
                commands::set_id::run(&ctx, &args, json).await
            }
        }
    }
}
