//! Status command implementation.

use anyhow::Result;
use clap::Args;

use crate::application::services::status::check_status;
use crate::infra::{FileRecordStore, SshSessionFactory};
use crate::output::OutputContext;

#[derive(Args)]
pub struct StatusArgs {
    /// Host record to check
    pub target: String,
}

/// Probe and report agent status for one target.
///
/// # Errors
///
/// Fails on configuration problems only; a failed remote probe degrades to
/// the persisted state.
pub async fn run(ctx: &OutputContext, args: &StatusArgs, json: bool) -> Result<()> {
    let config = crate::infra::config::load()?;
    let sessions = SshSessionFactory;
    let records = FileRecordStore::new(config.records_dir.clone());

    let status = match check_status(&sessions, &records, &config, &args.target).await {
        Ok(status) => status,
        Err(err) => {
            if json {
                super::report_json_error(&err);
            }
            return Err(err);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    ctx.kv("installed", if status.installed { "yes" } else { "no" });
    match &status.identity {
        Some(identity) => ctx.kv("identity", identity.as_str()),
        None if status.installed => {
            ctx.warn("installed, but no identity is known — run install or set-id");
        }
        None => {}
    }
    Ok(())
}
