//! Version command implementation.

use anyhow::Result;

/// Print the deskpilot version.
///
/// # Errors
///
/// Never fails in practice; `Result` keeps the handler signature uniform.
pub fn run(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        println!("{}", serde_json::json!({ "version": version }));
    } else {
        println!("deskpilot {version}");
    }
    Ok(())
}
