//! Install outcome classification from captured script output.

use deskpilot_common::{AgentIdentity, SentinelEvent, parse_line};
use serde::Serialize;

/// Terminal result of one installation run. Produced exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InstallOutcome {
    /// The agent is installed and reported its identity.
    Success {
        identity: AgentIdentity,
        permissions_required: bool,
    },
    /// The agent is installed but its identity must be entered manually.
    ManualIdentityRequired,
    /// The run produced no usable signal.
    Failure { reason: String },
}

/// Phrases the install script prints while making progress. Output that
/// mentions one of these but reaches no terminal sentinel is classified as
/// `ManualIdentityRequired` rather than `Failure`: the script demonstrably
/// ran, only identity derivation fell short. This leniency can mask a
/// mid-script crash; it is kept because operators prefer a manual-entry
/// prompt over a retry loop against a half-installed host.
const RAN_BUT_INCONCLUSIVE: &[&str] =
    &["already installed", "Starting ViewLink", "Configuring ViewLink"];

/// Everything a single pass over the captured output yields: progress
/// milestones in emission order plus the terminal markers.
#[derive(Debug, Default)]
pub struct OutputScan {
    pub progress: Vec<(u8, String)>,
    pub identity: Option<AgentIdentity>,
    pub manual_required: bool,
    pub permissions_required: bool,
}

impl OutputScan {
    /// Scan output line by line. Each line is matched once against the
    /// sentinel prefixes; progress lines are kept in order, without
    /// deduplication (a retry phase legitimately re-reports a milestone).
    #[must_use]
    pub fn scan(output: &str) -> Self {
        let mut scan = Self::default();
        for line in output.lines() {
            match parse_line(line) {
                Some(SentinelEvent::Progress { percent, message }) => {
                    scan.progress.push((percent, message));
                }
                Some(SentinelEvent::Identity(id)) => {
                    if scan.identity.is_none() {
                        scan.identity = Some(id);
                    }
                }
                Some(SentinelEvent::ManualIdRequired) => scan.manual_required = true,
                Some(SentinelEvent::PermissionsRequired) => scan.permissions_required = true,
                None => {}
            }
        }
        scan
    }

    /// Classify the terminal outcome.
    ///
    /// Order matters: the identity sentinel wins even when the manual-entry
    /// sentinel also appears (an earlier retry phase may have printed it);
    /// the permissions flag rides along with success and never demotes it.
    #[must_use]
    pub fn classify(&self, raw_output: &str) -> InstallOutcome {
        if let Some(identity) = &self.identity {
            return InstallOutcome::Success {
                identity: identity.clone(),
                permissions_required: self.permissions_required,
            };
        }
        if self.manual_required {
            return InstallOutcome::ManualIdentityRequired;
        }
        if RAN_BUT_INCONCLUSIVE.iter().any(|phrase| raw_output.contains(phrase)) {
            return InstallOutcome::ManualIdentityRequired;
        }
        InstallOutcome::Failure {
            reason: format!("no terminal sentinel in output; tail: {}", output_tail(raw_output)),
        }
    }
}

/// Last fragment of captured output, for failure messages.
fn output_tail(output: &str) -> String {
    const TAIL: usize = 400;
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return "(no output)".to_owned();
    }
    let start = trimmed.len().saturating_sub(TAIL);
    // Avoid slicing mid-codepoint.
    let start = (start..trimmed.len()).find(|i| trimmed.is_char_boundary(*i)).unwrap_or(0);
    trimmed[start..].to_owned()
}
