//! Install command implementation.

use anyhow::Result;
use clap::Args;

use crate::application::ports::NullSink;
use crate::application::services::install::install;
use crate::domain::outcome::InstallOutcome;
use crate::infra::{FileRecordStore, FileSecretStore, SshSessionFactory};
use crate::output::reporter::{BarReporter, TerminalReporter};
use crate::output::{OutputContext, progress};

#[derive(Args)]
pub struct InstallArgs {
    /// Host record to provision
    pub target: String,

    /// Connection passcode for the agent; falls back to the secret store
    #[arg(long)]
    pub secret: Option<String>,
}

/// Run the install pipeline against one target.
///
/// # Errors
///
/// Returns an error for configuration problems, connection-level failures,
/// and (in human mode) a `Failure` outcome, so the process exits non-zero.
pub async fn run(ctx: &OutputContext, args: &InstallArgs, json: bool) -> Result<()> {
    let config = crate::infra::config::load()?;
    let sessions = SshSessionFactory;
    let records = FileRecordStore::new(config.records_dir.clone());
    let secrets = FileSecretStore::new(config.secrets_file.clone());
    let target = args.target.as_str();
    let secret = args.secret.clone();

    let result = if json || ctx.quiet {
        install(&sessions, &records, &secrets, &NullSink, &config, target, secret).await
    } else if ctx.show_progress() {
        let reporter = BarReporter::new(progress::install_bar());
        let result =
            install(&sessions, &records, &secrets, &reporter, &config, target, secret).await;
        match &result {
            Ok(InstallOutcome::Success { .. }) => {
                progress::finish_success(reporter.bar(), "install script finished");
            }
            _ => reporter.bar().finish_and_clear(),
        }
        result
    } else {
        let reporter = TerminalReporter::new(ctx);
        install(&sessions, &records, &secrets, &reporter, &config, target, secret).await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if json {
                super::report_json_error(&err);
            }
            return Err(err);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        InstallOutcome::Success { identity, permissions_required } => {
            ctx.success(&format!("ViewLink installed — ID {identity}"));
            if permissions_required {
                ctx.warn(
                    "grant Screen Recording and Accessibility permissions on the host to finish setup",
                );
            }
            Ok(())
        }
        InstallOutcome::ManualIdentityRequired => {
            ctx.warn(&format!(
                "ViewLink installed, but its ID could not be derived — read it on the host and run: deskpilot set-id {target} <id>"
            ));
            Ok(())
        }
        InstallOutcome::Failure { reason } => anyhow::bail!("installation failed: {reason}"),
    }
}
