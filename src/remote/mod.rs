// ABOUTME: Remote shell capabilities the engines are written against.
// ABOUTME: Production backend is the russh fleet; tests substitute an in-memory one.

mod error;
mod ssh;

pub use error::{RemoteError, Result};
pub use ssh::{SshConfig, SshFleet};

use async_trait::async_trait;
use std::path::Path;

/// Output captured from one remote command.
#[derive(Debug, Clone)]
pub struct RemoteOutput {
    pub exit_code: u32,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stderr if non-empty, otherwise stdout. What error reports carry.
    pub fn captured(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Run a shell command on a named host and capture its output.
#[async_trait]
pub trait RemoteExec: Send + Sync {
    async fn exec(&self, host: &str, command: &str) -> Result<RemoteOutput>;
}

/// Push a local file to a path on a named host.
#[async_trait]
pub trait RemoteCopy: Send + Sync {
    async fn copy(&self, host: &str, local: &Path, remote: &str) -> Result<()>;
}

/// Full transport capability - auto-implemented for any type providing both.
pub trait Remote: RemoteExec + RemoteCopy {}

impl<T> Remote for T where T: RemoteExec + RemoteCopy {}

/// Run a command and fail on a non-zero exit, carrying the captured output.
pub async fn exec_checked<R: RemoteExec + ?Sized>(
    remote: &R,
    host: &str,
    command: &str,
) -> Result<RemoteOutput> {
    tracing::debug!("{}: {}", host, command);
    let output = remote.exec(host, command).await?;
    if !output.success() {
        return Err(RemoteError::CommandFailed {
            host: host.to_string(),
            command: command.to_string(),
            exit_code: output.exit_code,
            output: output.captured().to_string(),
        });
    }
    Ok(output)
}
