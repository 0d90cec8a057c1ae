//! Domain layer — pure types and logic with no I/O.
//!
//! This module imports only from `deskpilot_common` and the standard
//! library — never from `crate::infra`, `crate::commands`, or
//! `crate::output`.

pub mod config;
pub mod error;
pub mod outcome;
pub mod platform;
pub mod script;
pub mod target;

pub use config::EngineConfig;
pub use error::{ExecError, ProvisionError};
pub use outcome::{InstallOutcome, OutputScan};
pub use platform::PlatformKind;
pub use target::TargetDescriptor;
