//! Script deployment with transport fallback.
//!
//! The primary transport copies the script in one shot; hosts with
//! payload-size or binary-unsafe limits on the bulk channel get a second
//! chance through line-chunked appends. The two transports implement one
//! strategy trait and are tried in order; only when both fail does the
//! deployer surface [`ProvisionError::Transfer`].

use std::io::Write as _;

use anyhow::{Context, Result};

use crate::application::ports::{FileTransfer, RemoteExecutor};
use crate::domain::config::EngineConfig;
use crate::domain::error::ProvisionError;
use crate::domain::script::escape_single_quotes;

/// One way of materializing script text at a remote path.
#[allow(async_fn_in_trait)]
pub trait ScriptTransport {
    fn name(&self) -> &'static str;

    async fn send(&self, script: &str, remote_path: &str) -> Result<()>;
}

// ── Bulk copy ─────────────────────────────────────────────────────────────────

/// Primary transport: local temp file + one-shot `scp`.
pub struct BulkCopy<'a, S: FileTransfer> {
    session: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: FileTransfer> BulkCopy<'a, S> {
    pub fn new(session: &'a S, config: &'a EngineConfig) -> Self {
        Self { session, config }
    }
}

impl<S: FileTransfer> ScriptTransport for BulkCopy<'_, S> {
    fn name(&self) -> &'static str {
        "bulk-copy"
    }

    async fn send(&self, script: &str, remote_path: &str) -> Result<()> {
        let mut local = tempfile::NamedTempFile::new().context("creating local script file")?;
        local.write_all(script.as_bytes()).context("writing local script file")?;
        local.flush().context("flushing local script file")?;

        self.session
            .upload(local.path(), remote_path, self.config.transfer_timeout())
            .await
            .context("bulk script transfer")?;
        Ok(())
    }
}

// ── Chunked append ────────────────────────────────────────────────────────────

/// Fallback transport: create an empty remote file, then append the script
/// in fixed-size line chunks via quote-escaped remote `echo` commands. Slower
/// by one round trip per chunk, but survives channels the bulk copy cannot.
pub struct ChunkedAppend<'a, S: RemoteExecutor> {
    session: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: RemoteExecutor> ChunkedAppend<'a, S> {
    pub fn new(session: &'a S, config: &'a EngineConfig) -> Self {
        Self { session, config }
    }
}

impl<S: RemoteExecutor> ScriptTransport for ChunkedAppend<'_, S> {
    fn name(&self) -> &'static str {
        "chunked-append"
    }

    async fn send(&self, script: &str, remote_path: &str) -> Result<()> {
        self.session
            .execute(&format!("touch {remote_path}"), self.config.chunk_timeout())
            .await
            .context("creating remote script file")?;

        let lines: Vec<&str> = script.split('\n').collect();
        for chunk in lines.chunks(self.config.chunk_lines.max(1)) {
            let escaped = escape_single_quotes(&chunk.join("\n"));
            let command = format!("echo '{escaped}' >> {remote_path}");
            self.session
                .execute(&command, self.config.chunk_timeout())
                .await
                .context("appending script chunk")?;
        }
        Ok(())
    }
}

// ── Deployer ──────────────────────────────────────────────────────────────────

/// Deploy the install script to the remote host and mark it executable.
///
/// # Errors
///
/// Returns [`ProvisionError::Transfer`] when both transports fail.
pub async fn deploy_script<S>(
    session: &S,
    config: &EngineConfig,
    script: &str,
) -> Result<(), ProvisionError>
where
    S: RemoteExecutor + FileTransfer,
{
    let remote_path = &config.remote_script_path;

    let bulk = BulkCopy::new(session, config);
    if let Err(primary) = bulk.send(script, remote_path).await {
        let chunked = ChunkedAppend::new(session, config);
        chunked.send(script, remote_path).await.map_err(|fallback| {
            ProvisionError::Transfer(format!(
                "{}: {primary:#}; {}: {fallback:#}",
                bulk.name(),
                chunked.name()
            ))
        })?;
    }

    session
        .execute(&format!("chmod +x {remote_path}"), config.chunk_timeout())
        .await
        .map_err(|err| ProvisionError::Transfer(format!("marking script executable: {err}")))?;
    Ok(())
}
