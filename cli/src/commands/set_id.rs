//! Manual identity entry — the fallback path when discovery comes up empty.

use anyhow::Result;
use clap::Args;

use crate::application::services::status::set_identity_manually;
use crate::infra::FileRecordStore;
use crate::output::OutputContext;

#[derive(Args)]
pub struct SetIdArgs {
    /// Host record to update
    pub target: String,

    /// The nine-digit agent ID shown on the host
    pub identity: String,
}

/// Record a user-entered agent identity.
///
/// # Errors
///
/// Fails when the identity is malformed or the record does not exist.
pub async fn run(ctx: &OutputContext, args: &SetIdArgs, json: bool) -> Result<()> {
    let config = crate::infra::config::load()?;
    let records = FileRecordStore::new(config.records_dir.clone());

    let identity = match set_identity_manually(&records, &args.target, &args.identity).await {
        Ok(identity) => identity,
        Err(err) => {
            if json {
                super::report_json_error(&err);
            }
            return Err(err);
        }
    };

    if json {
        println!("{}", serde_json::json!({ "identity": identity.as_str() }));
    } else {
        ctx.success(&format!("identity {identity} recorded for {}", args.target));
    }
    Ok(())
}
