// ABOUTME: Transport error types.
// ABOUTME: A non-zero remote exit carries host, command, and captured output.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },

    #[error("authentication failed for {host}: no valid credentials")]
    AuthenticationFailed { host: String },

    #[error("SSH agent not available: {0}")]
    AgentUnavailable(String),

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("command on {host} exited {exit_code}: `{command}`: {output}")]
    CommandFailed {
        host: String,
        command: String,
        exit_code: u32,
        output: String,
    },

    #[error("command on {host} timed out after {timeout:?}: `{command}`")]
    CommandTimeout {
        host: String,
        command: String,
        timeout: Duration,
    },

    #[error("channel to {host} closed without exit status")]
    ChannelClosed { host: String },

    #[error("upload of {path} to {host} failed: {reason}")]
    CopyFailed {
        host: String,
        path: PathBuf,
        reason: String,
    },

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;
