//! Cascading identity discovery.
//!
//! A priority-ordered list of independent probes, each one remote command
//! under its own short timeout, stopping at the first output that is exactly
//! a valid agent identity. The list is configuration: new strategies are
//! added by appending, never by branching. Exhausting the list is a
//! legitimate `None`, not an error.

use deskpilot_common::AgentIdentity;

use crate::application::ports::RemoteExecutor;
use crate::domain::config::EngineConfig;
use crate::domain::platform::PlatformKind;

/// One discovery strategy: a human-readable name and the probe command.
#[derive(Debug, Clone)]
pub struct DiscoveryMethod {
    pub name: &'static str,
    pub command: String,
}

const DARWIN_BIN: &str = "/Applications/ViewLink.app/Contents/MacOS/ViewLink";

/// Discovery methods for a platform, ordered from cheapest and most
/// authoritative to most speculative.
#[must_use]
pub fn methods_for(platform: PlatformKind) -> Vec<DiscoveryMethod> {
    match platform {
        PlatformKind::Darwin => vec![
            DiscoveryMethod {
                name: "direct query",
                command: format!(
                    "{DARWIN_BIN} --get-id 2>/dev/null | grep -E '^[0-9]{{9}}$' | head -1"
                ),
            },
            DiscoveryMethod {
                name: "preference store",
                command: "defaults read com.viewlink.desk 2>/dev/null | grep -E 'id.*=.*[0-9]{9}' | grep -oE '[0-9]{9}' | head -1".to_owned(),
            },
            DiscoveryMethod {
                name: "config files",
                command: r#"for f in ~/Library/Preferences/com.viewlink.desk/ViewLink.toml ~/Library/Preferences/com.viewlink.desk/ViewLink2.toml ~/.config/viewlink/ViewLink.toml; do [ -f $f ] && grep -E 'id.*=.*[0-9]{9}' $f | grep -oE '[0-9]{9}' | head -1; done | head -1"#.to_owned(),
            },
            DiscoveryMethod {
                name: "library scan",
                command: "find ~/Library -name '*viewlink*' -type f 2>/dev/null | head -5 | xargs grep -oE '[0-9]{9}' 2>/dev/null | grep -E '^[0-9]{9}$' | head -1".to_owned(),
            },
            DiscoveryMethod {
                name: "process arguments",
                command: "ps aux | grep -i viewlink | grep -oE 'id:[0-9]{9}' | cut -d: -f2 | head -1".to_owned(),
            },
            DiscoveryMethod {
                name: "log files",
                command: "find ~/Library/Logs -name '*viewlink*' -type f 2>/dev/null | xargs grep -oE 'ID:.*[0-9]{9}' 2>/dev/null | grep -oE '[0-9]{9}' | head -1".to_owned(),
            },
            DiscoveryMethod {
                name: "binary strings",
                command: format!("strings {DARWIN_BIN} 2>/dev/null | grep -E '^[0-9]{{9}}$' | head -1"),
            },
            DiscoveryMethod {
                name: "application support",
                command: r#"find ~/Library/Application\ Support -name '*viewlink*' -type f 2>/dev/null | xargs grep -oE '[0-9]{9}' 2>/dev/null | grep -E '^[0-9]{9}$' | head -1"#.to_owned(),
            },
        ],
        PlatformKind::Linux => vec![
            DiscoveryMethod {
                name: "direct query",
                command: "viewlink --get-id 2>/dev/null | grep -E '^[0-9]{9}$' | head -1".to_owned(),
            },
            DiscoveryMethod {
                name: "config files",
                command: r#"for f in ~/.config/viewlink/ViewLink.toml ~/.config/viewlink/ViewLink2.toml; do [ -f $f ] && grep -E 'id.*=.*[0-9]{9}' $f | grep -oE '[0-9]{9}' | head -1; done | head -1"#.to_owned(),
            },
            DiscoveryMethod {
                name: "journal logs",
                command: "journalctl -u viewlink --no-pager 2>/dev/null | grep -oE 'ID:.*[0-9]{9}' | grep -oE '[0-9]{9}' | head -1".to_owned(),
            },
            DiscoveryMethod {
                name: "process arguments",
                command: "ps aux | grep -i viewlink | grep -oE 'id:[0-9]{9}' | cut -d: -f2 | head -1".to_owned(),
            },
            DiscoveryMethod {
                name: "home scan",
                command: "find ~ -name '*viewlink*' -type f 2>/dev/null | head -5 | xargs grep -oE '[0-9]{9}' 2>/dev/null | grep -E '^[0-9]{9}$' | head -1".to_owned(),
            },
        ],
    }
}

/// Try each discovery method in priority order; return the first valid
/// identity, or `None` when every method comes up empty. Individual probe
/// failures (timeout, broken connection) are swallowed and iteration
/// continues — a flaky probe must not mask a later authoritative one.
pub async fn extract_identity(
    session: &impl RemoteExecutor,
    platform: PlatformKind,
    config: &EngineConfig,
) -> Option<AgentIdentity> {
    for method in methods_for(platform) {
        let Ok(output) = session.execute(&method.command, config.probe_timeout()).await else {
            continue;
        };
        if let Ok(identity) = AgentIdentity::parse(&output.stdout) {
            return Some(identity);
        }
    }
    None
}
