//! deskpilot — ViewLink agent provisioning over SSH

use clap::Parser;

use deskpilot_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
