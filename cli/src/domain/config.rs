//! Engine configuration.
//!
//! Every remote operation's bound and every filesystem location the engine
//! touches comes from here, so tests and unusual deployments can redirect
//! them without code changes. Loading/saving lives in `infra::config`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the provisioning engine. All fields have serde defaults so a
/// partial config file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding SSH identity files.
    pub keys_dir: PathBuf,
    /// Directory holding host records (one JSON file per target).
    pub records_dir: PathBuf,
    /// YAML file mapping target refs to stored passcodes.
    pub secrets_file: PathBuf,
    /// Where the install script lands on the remote host.
    pub remote_script_path: String,
    /// Lines per round trip for the chunked-append transport.
    pub chunk_lines: usize,
    /// Bound for light probes (platform detection, status, discovery).
    pub probe_timeout_secs: u64,
    /// Bound for the one-shot bulk script transfer.
    pub transfer_timeout_secs: u64,
    /// Bound for each chunked-append round trip.
    pub chunk_timeout_secs: u64,
    /// Bound for the install script itself. Package managers are slow.
    pub install_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            keys_dir: home.join(".ssh"),
            records_dir: home.join(".deskpilot").join("hosts"),
            secrets_file: home.join(".deskpilot").join("secrets.yaml"),
            remote_script_path: "/tmp/deskpilot-install.sh".to_owned(),
            chunk_lines: 50,
            probe_timeout_secs: 10,
            transfer_timeout_secs: 60,
            chunk_timeout_secs: 30,
            install_timeout_secs: 300,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    #[must_use]
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    #[must_use]
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    #[must_use]
    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }
}
