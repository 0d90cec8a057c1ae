//! Engine configuration loading.
//!
//! YAML file at `~/.deskpilot/config.yaml`, overridable via the
//! `DESKPILOT_CONFIG` environment variable; defaults apply when the file is
//! absent or partial.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::config::EngineConfig;

/// Resolve the config file path.
///
/// # Errors
///
/// Returns an error if no home directory can be determined and no override
/// is set.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(val) = std::env::var("DESKPILOT_CONFIG") {
        return Ok(PathBuf::from(val));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".deskpilot").join("config.yaml"))
}

/// Load the engine configuration, falling back to defaults when no file
/// exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load() -> Result<EngineConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}
