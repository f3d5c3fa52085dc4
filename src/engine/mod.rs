// ABOUTME: The deploy, restart, and show engines plus their shared plumbing.
// ABOUTME: All remote mutation funnels through one dry-run-aware shell helper.

mod deploy;
mod meta;
mod restart;
mod show;

pub use deploy::{DeployEngine, DeployOptions};
pub use restart::{RestartEngine, RestartOptions};
pub use show::render_show;

use crate::remote::{Remote, RemoteError, RemoteExec, RemoteOutput, exec_checked};
use std::path::Path;

/// Quote a value for interpolation into a remote shell command.
/// Dataset, snapshot, and path arguments stay bare when shell-clean so
/// logged commands read like the operator typed them.
pub(crate) fn q(value: &str) -> String {
    let clean = !value.is_empty()
        && value.bytes().all(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'@' | b':' | b'.' | b'/' | b'-' | b'_' | b',' | b'+')
        });
    if clean {
        value.to_string()
    } else {
        shell_words::quote(value).into_owned()
    }
}

/// Local username, used to namespace dump and temp files.
pub(crate) fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

/// Dump file path on remote hosts for one project's delta stream.
pub(crate) fn dump_path(project: &str) -> String {
    format!(
        "/tmp/{}.{}.{}.{}",
        env!("CARGO_PKG_NAME"),
        current_user(),
        std::process::id(),
        project
    )
}

/// Issues remote commands for an engine run. Reads always execute;
/// mutations are suppressed and logged when dry-run is active.
pub(crate) struct Shell<'a, R: ?Sized> {
    remote: &'a R,
    dry_run: bool,
}

impl<'a, R: RemoteExec + ?Sized> Shell<'a, R> {
    pub fn new(remote: &'a R, dry_run: bool) -> Self {
        Self { remote, dry_run }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// A read-only command. Runs even under dry-run.
    pub async fn read(&self, host: &str, command: &str) -> Result<RemoteOutput, RemoteError> {
        exec_checked(self.remote, host, command).await
    }

    /// A state-changing command. Under dry-run it is logged and skipped.
    pub async fn mutate(&self, host: &str, command: &str) -> Result<(), RemoteError> {
        if self.dry_run {
            tracing::info!("{}: would run: {}", host, command);
            return Ok(());
        }
        exec_checked(self.remote, host, command).await?;
        Ok(())
    }
}

impl<'a, R: Remote + ?Sized> Shell<'a, R> {
    /// Push a local file to the host. Mutating, so dry-run skips it.
    pub async fn upload(
        &self,
        host: &str,
        local: &Path,
        remote_path: &str,
    ) -> Result<(), RemoteError> {
        if self.dry_run {
            tracing::info!("{}: would upload {} to {}", host, local.display(), remote_path);
            return Ok(());
        }
        tracing::debug!("{}: upload {} -> {}", host, local.display(), remote_path);
        self.remote.copy(host, local, remote_path).await
    }
}
