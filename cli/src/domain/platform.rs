//! Remote platform classification from a kernel-name probe.

use serde::Serialize;

use crate::domain::error::ProvisionError;

/// OS family of the remote host. Derived once per run, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Linux,
    Darwin,
}

/// Markers of Windows POSIX-emulation layers that `uname -s` can report.
const WINDOWS_MARKERS: &[&str] = &["mingw", "msys", "cygwin"];

impl PlatformKind {
    /// Classify `uname -s` output, case-insensitively.
    ///
    /// Anything that is not Darwin and not a Windows subsystem is treated as
    /// Linux — the install script re-checks what it is actually running on.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnsupportedPlatform`] for Windows-subsystem
    /// kernels, which this engine cannot provision.
    pub fn classify(uname_output: &str) -> Result<Self, ProvisionError> {
        let lowered = uname_output.to_ascii_lowercase();
        if lowered.contains("darwin") {
            return Ok(Self::Darwin);
        }
        if WINDOWS_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            return Err(ProvisionError::UnsupportedPlatform(uname_output.trim().to_owned()));
        }
        Ok(Self::Linux)
    }
}
