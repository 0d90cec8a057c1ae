//! SSH-backed session: the production `RemoteExecutor` and `FileTransfer`.
//!
//! Commands run through the system `ssh`/`scp` binaries, spawned via tokio
//! with a guaranteed kill on timeout. `tokio::time::timeout` around
//! `.output().await` does not kill the child when the future is dropped, so
//! the implementation uses `tokio::select!` with an explicit `child.kill()`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;

use crate::application::ports::{ExecOutput, FileTransfer, RemoteExecutor, SessionFactory};
use crate::domain::error::ExecError;
use crate::domain::target::TargetDescriptor;

/// ssh reserves exit code 255 for its own failures (unreachable host, auth
/// rejection); remote commands cannot produce it.
const SSH_EXIT_CONNECTION: i32 = 255;

/// Options shared by every ssh/scp invocation. `BatchMode` keeps a missing
/// key from hanging on a password prompt.
const COMMON_OPTS: &[&str] = &[
    "-o",
    "BatchMode=yes",
    "-o",
    "ConnectTimeout=10",
    "-o",
    "StrictHostKeyChecking=no",
    "-o",
    "UserKnownHostsFile=/dev/null",
];

/// Opens [`SshSession`]s. Stateless; safe to share across concurrent runs.
pub struct SshSessionFactory;

impl SessionFactory for SshSessionFactory {
    type Session = SshSession;

    fn open(&self, target: &TargetDescriptor) -> SshSession {
        SshSession {
            target: target.clone(),
        }
    }
}

/// One target's SSH session handle. Holds no live connection — each call
/// spawns a fresh process, so a run can be abandoned by simply not awaiting.
pub struct SshSession {
    target: TargetDescriptor,
}

impl SshSession {
    fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = vec!["-i".to_owned(), self.target.identity_file.display().to_string()];
        args.extend(COMMON_OPTS.iter().map(|s| (*s).to_owned()));
        args.push("-p".to_owned());
        args.push(self.target.port.to_string());
        args.push(self.target.login());
        args.push(command.to_owned());
        args
    }

    fn scp_args(&self, local: &Path, remote: &str) -> Vec<String> {
        let mut args = vec!["-i".to_owned(), self.target.identity_file.display().to_string()];
        args.extend(COMMON_OPTS.iter().map(|s| (*s).to_owned()));
        args.push("-P".to_owned());
        args.push(self.target.port.to_string());
        args.push(local.display().to_string());
        args.push(format!("{}:{remote}", self.target.login()));
        args
    }
}

impl RemoteExecutor for SshSession {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecOutput, ExecError> {
        let output = run_with_timeout("ssh", &self.ssh_args(command), timeout).await?;
        if output.exit_code == SSH_EXIT_CONNECTION {
            return Err(ExecError::Connection(connection_detail(&output)));
        }
        Ok(output)
    }
}

impl FileTransfer for SshSession {
    async fn upload(
        &self,
        local: &Path,
        remote: &str,
        timeout: Duration,
    ) -> Result<(), ExecError> {
        let output = run_with_timeout("scp", &self.scp_args(local, remote), timeout).await?;
        if output.exit_code != 0 {
            return Err(ExecError::Connection(connection_detail(&output)));
        }
        Ok(())
    }
}

fn connection_detail(output: &ExecOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        format!("exit code {}", output.exit_code)
    } else {
        stderr.to_owned()
    }
}

/// Spawn a process with captured output, killing it if `timeout` elapses.
async fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<ExecOutput, ExecError> {
    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| ExecError::Connection(format!("failed to spawn {program}: {err}")))?;

    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            let status = status
                .map_err(|err| ExecError::Connection(format!("waiting for {program}: {err}")))?;
            Ok(ExecOutput {
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                exit_code: status.code().unwrap_or(-1),
            })
        } => result,
        () = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            Err(ExecError::Timeout(timeout.as_secs()))
        }
    }
}
