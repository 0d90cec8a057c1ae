//! Command handlers — thin glue between the CLI surface and the services.

pub mod install;
pub mod set_id;
pub mod status;
pub mod version;

use crate::domain::error::{ExecError, ProvisionError};

/// Stable machine-readable code for the `--json` error object.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(provision) = err.downcast_ref::<ProvisionError>() {
        return match provision {
            ProvisionError::InvalidTarget(_) => "invalid_target",
            ProvisionError::RecordNotFound(_) => "record_not_found",
            ProvisionError::UnsupportedPlatform(_) => "unsupported_platform",
            ProvisionError::Transfer(_) => "transfer_failure",
        };
    }
    if let Some(exec) = err.downcast_ref::<ExecError>() {
        return match exec {
            ExecError::Timeout(_) => "timeout",
            ExecError::Connection(_) => "connection_error",
        };
    }
    "internal"
}

/// In `--json` mode, print the error object before bubbling the error up.
pub fn report_json_error(err: &anyhow::Error) {
    if let Ok(obj) = crate::output::json::format_error(&format!("{err:#}"), error_code(err)) {
        println!("{obj}");
    }
}
