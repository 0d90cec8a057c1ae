//! The sentinel line protocol emitted by the remote install script.
//!
//! The install script communicates through its stdout: progress milestones
//! and exactly one terminal marker per run. The markers below are a wire
//! contract shared with the script composer and with any collaborator that
//! replays captured output — they must not change without coordinating both
//! sides.

use crate::identity::AgentIdentity;

/// Progress milestone marker: `PROGRESS:<percent>:<message>`.
pub const PROGRESS_PREFIX: &str = "PROGRESS:";

/// Identity marker: `VIEWLINK_ID:<nine digits>`.
pub const IDENTITY_PREFIX: &str = "VIEWLINK_ID:";

/// Terminal marker — installed, but no identity could be derived.
pub const MANUAL_ID_REQUIRED: &str = "MANUAL_ID_REQUIRED";

/// Marker — a platform capability grant needs interactive user action.
/// May co-occur with the identity marker.
pub const PERMISSIONS_REQUIRED: &str = "PERMISSIONS_REQUIRED";

/// One typed event parsed from a single output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelEvent {
    /// A `PROGRESS:<percent>:<message>` milestone.
    Progress { percent: u8, message: String },
    /// The agent reported its identity.
    Identity(AgentIdentity),
    /// Installed, but the identity must be entered manually.
    ManualIdRequired,
    /// A permission grant requires interactive action on the host.
    PermissionsRequired,
}

/// Parse one line of remote output into a sentinel event, if it is one.
///
/// Lines are matched against a small ordered set of prefixes; anything else
/// (including malformed near-misses such as `PROGRESS:abc:msg`) is `None`.
#[must_use]
pub fn parse_line(line: &str) -> Option<SentinelEvent> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        let (percent, message) = rest.split_once(':')?;
        let percent = percent.trim().parse::<u8>().ok()?;
        return Some(SentinelEvent::Progress {
            percent,
            message: message.trim().to_owned(),
        });
    }

    if let Some(rest) = line.strip_prefix(IDENTITY_PREFIX) {
        return AgentIdentity::parse(rest).ok().map(SentinelEvent::Identity);
    }

    if line == MANUAL_ID_REQUIRED {
        return Some(SentinelEvent::ManualIdRequired);
    }

    if line == PERMISSIONS_REQUIRED {
        return Some(SentinelEvent::PermissionsRequired);
    }

    None
}
