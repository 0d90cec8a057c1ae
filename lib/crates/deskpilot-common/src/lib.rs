//! Shared types for the deskpilot provisioning engine.
//!
//! This crate owns the pieces of the contract that other services consume:
//! the validated agent identity, the sentinel line protocol emitted by the
//! remote install script, and the persisted host/agent record shapes.

pub mod identity;
pub mod sentinel;
pub mod types;

pub use identity::{AgentIdentity, IDENTITY_LEN, InvalidIdentity};
pub use sentinel::{SentinelEvent, parse_line};
pub use types::{AgentStatus, HostRecord, PersistedAgentState, ProgressEvent};
