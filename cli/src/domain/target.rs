//! Target resolution: from a persisted host record to a connection
//! descriptor.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use deskpilot_common::HostRecord;
use regex::Regex;

use crate::domain::error::ProvisionError;

/// Hosts that are never valid provisioning targets. `asdf` is a sentinel
/// value seeded by the record store's test fixtures.
const DISALLOWED_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "asdf"];

/// Key name used when a record does not specify one.
const DEFAULT_KEY_NAME: &str = "deskpilot";

#[allow(clippy::expect_used)] // compile-time constant pattern
static CONNECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([^@]+)@)?([^:]+)(?::(\d+))?$").expect("valid connection pattern")
});

/// Immutable connection descriptor for one provisioning run.
///
/// Rebuilt from the persisted record on every call; never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub host: String,
    pub username: String,
    pub port: u16,
    pub identity_file: PathBuf,
}

impl TargetDescriptor {
    /// Build a descriptor from a host record.
    ///
    /// Explicit `host`/`username`/`port` fields win; otherwise the legacy
    /// `user@host:port` connection string is parsed. The identity file
    /// follows the per-owner, per-key-name convention
    /// `<keys_dir>/id_<owner>_<key_name>` so different owners can reuse key
    /// names without collision.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidTarget`] when no host can be derived
    /// or the host is a disallowed placeholder.
    pub fn resolve(record: &HostRecord, keys_dir: &Path) -> Result<Self, ProvisionError> {
        let (host, username, port) = match &record.host {
            Some(host) => (
                host.clone(),
                record.username.clone().unwrap_or_else(|| "root".to_owned()),
                record.port.unwrap_or(22),
            ),
            None => {
                let connection = record.connection.as_deref().ok_or_else(|| {
                    ProvisionError::InvalidTarget("record has no host or connection string".to_owned())
                })?;
                parse_connection(connection)?
            }
        };

        if DISALLOWED_HOSTS.contains(&host.to_ascii_lowercase().as_str()) {
            return Err(ProvisionError::InvalidTarget(format!(
                "host '{host}' is a placeholder, not a reachable target"
            )));
        }

        let key_name = record.key_name.as_deref().unwrap_or(DEFAULT_KEY_NAME);
        let identity_file = keys_dir.join(format!("id_{owner}_{key_name}", owner = record.owner_id));

        Ok(Self { host, username, port, identity_file })
    }

    /// `user@host` form used in ssh/scp argument vectors.
    #[must_use]
    pub fn login(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// Parse a `user@host:port` connection string. User defaults to `root`,
/// port to 22.
fn parse_connection(connection: &str) -> Result<(String, String, u16), ProvisionError> {
    let caps = CONNECTION_RE.captures(connection.trim()).ok_or_else(|| {
        ProvisionError::InvalidTarget(format!("unparseable connection string '{connection}'"))
    })?;

    let username = caps.get(1).map_or("root", |m| m.as_str()).to_owned();
    #[allow(clippy::expect_used)] // group 2 is non-optional in the pattern
    let host = caps.get(2).expect("host group").as_str().to_owned();
    let port = match caps.get(3) {
        Some(m) => m.as_str().parse::<u16>().map_err(|_| {
            ProvisionError::InvalidTarget(format!("port out of range in '{connection}'"))
        })?,
        None => 22,
    };

    Ok((host, username, port))
}

/// Validate a target reference (host record name) before it is used as a
/// file-name component. Rejects path separators and anything outside
/// `[A-Za-z0-9._-]`.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidTarget`] for empty or unsafe names.
pub fn validate_target_ref(target: &str) -> Result<(), ProvisionError> {
    let ok = !target.is_empty()
        && target.len() <= 64
        && target
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(ProvisionError::InvalidTarget(format!("unsafe target reference '{target}'")))
    }
}
