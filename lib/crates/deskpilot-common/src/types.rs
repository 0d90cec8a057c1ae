//! Persisted record shapes and progress events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::AgentIdentity;

/// Agent state stored on a host record.
///
/// Written only by the status synchronizer; the engine never re-reads it
/// within the same run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAgentState {
    /// Whether the agent is believed to be installed on the host.
    #[serde(default)]
    pub installed: bool,
    /// The discovered agent identity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<AgentIdentity>,
    /// When the agent was (last) installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

/// A persisted host/appliance record, owned by the record-store collaborator.
///
/// Connection fields come in two shapes: explicit `host`/`username`/`port`
/// columns, or a single `connection` string of the form `user@host:port`.
/// The target resolver prefers the explicit fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRecord {
    /// Hostname or IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Login user. Defaults to `root` during resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// SSH port. Defaults to 22 during resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Combined `user@host:port` connection string (legacy records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    /// Name of the SSH key this record connects with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Owner of the record; scopes the key-file naming convention.
    #[serde(default = "default_owner")]
    pub owner_id: u32,
    /// Agent provisioning state.
    #[serde(default)]
    pub agent: PersistedAgentState,
}

fn default_owner() -> u32 {
    1
}

impl Default for HostRecord {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            port: None,
            connection: None,
            key_name: None,
            owner_id: default_owner(),
            agent: PersistedAgentState::default(),
        }
    }
}

/// Result of a status check: what is currently believed about the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<AgentIdentity>,
}

/// One progress milestone relayed from the remote install script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
