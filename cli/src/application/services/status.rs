//! Status checking and idempotent state reconciliation.
//!
//! `check_status` re-enters the pipeline at the identity extractor and never
//! errors on a pure read: when the remote probe itself fails, it degrades to
//! the last-known persisted state. `reconcile` is the only writer of
//! persisted agent state.

use anyhow::Result;
use chrono::Utc;
use deskpilot_common::{AgentIdentity, AgentStatus, PersistedAgentState};

use crate::application::ports::{RecordStore, RemoteExecutor, SessionFactory};
use crate::application::services::discovery;
use crate::domain::config::EngineConfig;
use crate::domain::error::ProvisionError;
use crate::domain::platform::PlatformKind;
use crate::domain::target::{TargetDescriptor, validate_target_ref};

/// Remote probe answering whether the agent is present at all.
const INSTALL_PROBE: &str = "if command -v viewlink >/dev/null 2>&1 || [ -d /Applications/ViewLink.app ]; then echo INSTALLED; else echo NOT_INSTALLED; fi";

/// Check the current agent status of a target.
///
/// # Errors
///
/// Fails only on configuration problems (unsafe target ref, missing record)
/// or a record-store write failure — never on a failed remote probe.
pub async fn check_status(
    sessions: &impl SessionFactory,
    records: &impl RecordStore,
    config: &EngineConfig,
    target: &str,
) -> Result<AgentStatus> {
    validate_target_ref(target)?;
    let record = records
        .load(target)
        .await?
        .ok_or_else(|| ProvisionError::RecordNotFound(target.to_owned()))?;
    let previous = record.agent.clone();

    // No usable connection info: report what the record says.
    let Ok(descriptor) = TargetDescriptor::resolve(&record, &config.keys_dir) else {
        return Ok(status_of(&previous));
    };
    let session = sessions.open(&descriptor);

    let Ok(probe) = session.execute(INSTALL_PROBE, config.probe_timeout()).await else {
        return Ok(status_of(&previous));
    };
    let installed = probe.stdout.lines().any(|line| line.trim() == "INSTALLED");

    let mut identity = None;
    if installed {
        identity = previous.identity.clone();
        if identity.is_none() {
            let platform = detect_platform_lenient(&session, config).await;
            identity = discovery::extract_identity(&session, platform, config).await;
        }
    }

    let observed = PersistedAgentState {
        installed,
        identity,
        installed_at: None,
    };
    let current = reconcile(records, target, &previous, observed).await?;
    Ok(status_of(&current))
}

/// Record a user-entered identity for a target.
///
/// # Errors
///
/// Fails when the target ref is unsafe, the identity is malformed, or the
/// record does not exist.
pub async fn set_identity_manually(
    records: &impl RecordStore,
    target: &str,
    identity: &str,
) -> Result<AgentIdentity> {
    validate_target_ref(target)?;
    let identity = AgentIdentity::parse(identity)?;
    let record = records
        .load(target)
        .await?
        .ok_or_else(|| ProvisionError::RecordNotFound(target.to_owned()))?;

    let observed = PersistedAgentState {
        installed: true,
        identity: Some(identity.clone()),
        installed_at: None,
    };
    reconcile(records, target, &record.agent, observed).await?;
    Ok(identity)
}

/// Idempotent reconciliation of observed against persisted agent state.
///
/// Writes only on change. An inconclusive identity probe never downgrades a
/// previously known identity to null — only an explicit not-installed signal
/// clears it — so transient probe failures cannot flap the record.
///
/// Returns the state now persisted (written or unchanged).
pub async fn reconcile(
    records: &impl RecordStore,
    target: &str,
    previous: &PersistedAgentState,
    mut observed: PersistedAgentState,
) -> Result<PersistedAgentState> {
    if observed.installed {
        if observed.identity.is_none() {
            observed.identity = previous.identity.clone();
        }
        observed.installed_at = previous
            .installed_at
            .filter(|_| previous.installed)
            .or(Some(Utc::now()));
    } else {
        observed.identity = None;
        observed.installed_at = None;
    }

    if observed != *previous {
        records.save_agent_state(target, &observed).await?;
    }
    Ok(observed)
}

fn status_of(state: &PersistedAgentState) -> AgentStatus {
    AgentStatus {
        installed: state.installed,
        identity: state.identity.clone(),
    }
}

/// Platform detection for status probes. Failures (including Windows
/// subsystems) fall back to Linux: discovery methods then simply find
/// nothing, which reconciliation treats as inconclusive.
async fn detect_platform_lenient(
    session: &impl RemoteExecutor,
    config: &EngineConfig,
) -> PlatformKind {
    match session.execute("uname -s", config.probe_timeout()).await {
        Ok(output) => PlatformKind::classify(&output.stdout).unwrap_or(PlatformKind::Linux),
        Err(_) => PlatformKind::Linux,
    }
}
