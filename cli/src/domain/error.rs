//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator. `ExecError` is the failure mode of
//! the remote-executor port; `ProvisionError` covers everything the
//! provisioning pipeline itself can reject.

use thiserror::Error;

/// Errors from the provisioning pipeline.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Bad target configuration — fatal, never retried.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// No host record with the given name exists.
    #[error("no host record named '{0}'")]
    RecordNotFound(String),

    /// The remote host runs a platform this engine cannot provision.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Both script transports failed.
    #[error("script transfer failed: {0}")]
    Transfer(String),
}

/// Failure modes of a single remote command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The per-call bound elapsed. During script execution this maps to a
    /// `Failure` outcome rather than an error, because a partially-run
    /// script leaves ambiguous state that must be reported.
    #[error("remote command timed out after {0}s")]
    Timeout(u64),

    /// The session could not be established or broke mid-command.
    /// Transient — the caller may retry the whole run.
    #[error("connection failed: {0}")]
    Connection(String),
}
