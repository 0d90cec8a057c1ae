//! The install orchestration pipeline.
//!
//! One sequential run per target: resolve → detect platform → compose →
//! deploy → execute → classify → reconcile. Every remote step is
//! individually timeout-bounded; an execution timeout becomes a `Failure`
//! outcome (a partially-run script leaves state that must be reported), and
//! only a connection-level failure with no output at all surfaces as an
//! error.

use anyhow::Result;
use chrono::Utc;
use deskpilot_common::{PersistedAgentState, ProgressEvent};

use crate::application::ports::{
    ProgressSink, RecordStore, RemoteExecutor, SecretStore, SessionFactory,
};
use crate::application::services::{deploy, status};
use crate::domain::config::EngineConfig;
use crate::domain::error::{ExecError, ProvisionError};
use crate::domain::outcome::{InstallOutcome, OutputScan};
use crate::domain::platform::PlatformKind;
use crate::domain::script::{PASSCODE_ENV, compose_install_script, escape_single_quotes};
use crate::domain::target::{TargetDescriptor, validate_target_ref};

/// Install the ViewLink agent on a target and discover its identity.
///
/// Progress milestones from the remote script are relayed through `sink` as
/// discrete events, in order, without deduplication. The sink is
/// fire-and-forget; it can never abort the pipeline.
///
/// # Errors
///
/// Returns `InvalidTarget`/`RecordNotFound` before any remote call,
/// `UnsupportedPlatform` after detection, `Transfer` when both script
/// transports fail, and `Connection` when the session breaks with no output
/// to classify. Everything else is reported as an [`InstallOutcome`].
pub async fn install(
    sessions: &impl SessionFactory,
    records: &impl RecordStore,
    secrets: &impl SecretStore,
    sink: &impl ProgressSink,
    config: &EngineConfig,
    target: &str,
    inline_secret: Option<String>,
) -> Result<InstallOutcome> {
    validate_target_ref(target)?;
    let record = records
        .load(target)
        .await?
        .ok_or_else(|| ProvisionError::RecordNotFound(target.to_owned()))?;

    // Idempotency short-circuit: a record that already carries an identity
    // needs no remote work.
    if record.agent.installed {
        if let Some(identity) = record.agent.identity.clone() {
            return Ok(InstallOutcome::Success {
                identity,
                permissions_required: false,
            });
        }
    }

    let descriptor = TargetDescriptor::resolve(&record, &config.keys_dir)?;
    let session = sessions.open(&descriptor);

    let platform = detect_platform(&session, config).await?;
    let secret = match inline_secret {
        Some(secret) => Some(secret),
        None => secrets.resolve(target).await?,
    };

    let script = compose_install_script(platform);
    deploy::deploy_script(&session, config, &script).await?;

    let command = run_command(config, secret.as_deref());
    let outcome = match session.execute(&command, config.install_timeout()).await {
        Ok(output) => {
            let scan = OutputScan::scan(&output.stdout);
            relay_progress(sink, &scan);
            scan.classify(&output.stdout)
        }
        Err(ExecError::Timeout(secs)) => InstallOutcome::Failure {
            reason: format!("install script timed out after {secs}s"),
        },
        Err(err @ ExecError::Connection(_)) => return Err(err.into()),
    };

    // Best-effort cleanup; a leftover script is not an error.
    let _ = session
        .execute(
            &format!("rm -f {}", config.remote_script_path),
            config.probe_timeout(),
        )
        .await;

    persist_outcome(records, target, &record.agent, &outcome).await?;
    Ok(outcome)
}

/// Detect the remote platform with one short probe. Probe failure is
/// non-fatal (the script re-checks what it runs on); a Windows subsystem is.
async fn detect_platform(
    session: &impl RemoteExecutor,
    config: &EngineConfig,
) -> Result<PlatformKind, ProvisionError> {
    match session.execute("uname -s", config.probe_timeout()).await {
        Ok(output) => PlatformKind::classify(&output.stdout),
        Err(_) => Ok(PlatformKind::Linux),
    }
}

/// Build the remote run command. The secret travels as a single-quote-escaped
/// exported environment variable, never interpolated into the script text.
fn run_command(config: &EngineConfig, secret: Option<&str>) -> String {
    let base = format!("bash {}", config.remote_script_path);
    match secret {
        Some(secret) => {
            format!("export {PASSCODE_ENV}='{}' && {base}", escape_single_quotes(secret))
        }
        None => base,
    }
}

fn relay_progress(sink: &impl ProgressSink, scan: &OutputScan) {
    for (percent, message) in &scan.progress {
        sink.emit(&ProgressEvent {
            percent: *percent,
            message: message.clone(),
            timestamp: Utc::now(),
        });
    }
}

/// One persistence write per run, routed through the reconciler. A `Failure`
/// outcome writes nothing — the run produced no new knowledge.
async fn persist_outcome(
    records: &impl RecordStore,
    target: &str,
    previous: &PersistedAgentState,
    outcome: &InstallOutcome,
) -> Result<()> {
    let observed = match outcome {
        InstallOutcome::Success { identity, .. } => PersistedAgentState {
            installed: true,
            identity: Some(identity.clone()),
            installed_at: None,
        },
        InstallOutcome::ManualIdentityRequired => PersistedAgentState {
            installed: true,
            identity: None,
            installed_at: None,
        },
        InstallOutcome::Failure { .. } => return Ok(()),
    };
    status::reconcile(records, target, previous, observed).await?;
    Ok(())
}
