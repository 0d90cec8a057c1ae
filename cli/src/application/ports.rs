//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `deskpilot_common` —
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use deskpilot_common::{HostRecord, PersistedAgentState, ProgressEvent};

use crate::domain::error::ExecError;
use crate::domain::target::TargetDescriptor;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Captured result of one remote command.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

// ── Remote Session Ports ──────────────────────────────────────────────────────

/// Runs one command on the remote host, blocking, bounded by `timeout`.
///
/// A timeout must surface as [`ExecError::Timeout`], never a silent hang; a
/// broken or unreachable session surfaces as [`ExecError::Connection`].
#[allow(async_fn_in_trait)]
pub trait RemoteExecutor {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecOutput, ExecError>;
}

/// Transfers one local file to a path on the remote host in a single shot.
#[allow(async_fn_in_trait)]
pub trait FileTransfer {
    async fn upload(&self, local: &Path, remote: &str, timeout: Duration)
    -> Result<(), ExecError>;
}

/// Opens a session bound to one target descriptor.
///
/// Sessions are cheap handles; a fresh one is opened per run so concurrent
/// runs against different targets share no state.
pub trait SessionFactory {
    type Session: RemoteExecutor + FileTransfer;

    fn open(&self, target: &TargetDescriptor) -> Self::Session;
}

// ── Persistence Ports ─────────────────────────────────────────────────────────

/// Read/write access to persisted host records.
///
/// The engine reads connection fields and writes only the agent-state slice;
/// record creation belongs to the CRUD collaborator.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Load the record for a target, `None` if it does not exist.
    async fn load(&self, target: &str) -> Result<Option<HostRecord>>;

    /// Persist a new agent state for the target.
    async fn save_agent_state(&self, target: &str, state: &PersistedAgentState) -> Result<()>;
}

/// Optional stored passcode lookup, consulted when none is supplied inline.
#[allow(async_fn_in_trait)]
pub trait SecretStore {
    async fn resolve(&self, target: &str) -> Result<Option<String>>;
}

// ── Progress Port ─────────────────────────────────────────────────────────────

/// Fire-and-forget relay for progress events. Sync trait — no async needed,
/// and implementations must never fail the pipeline.
pub trait ProgressSink {
    fn emit(&self, event: &ProgressEvent);
}

/// Sink that discards everything. Used by quiet/JSON surfaces and tests.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &ProgressEvent) {}
}
