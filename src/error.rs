// ABOUTME: Application-wide error types for jroll.
// ABOUTME: Module errors aggregate here; propagation is strictly fail-fast.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown project: {0}")]
    UnknownProject(String),

    #[error("project '{project}' has no group '{group}'")]
    UnknownGroup { project: String, group: String },

    #[error("{0}")]
    Usage(String),

    #[error("no snapshot on the super of '{project}' is present on every target")]
    NoCommonBase { project: String },

    #[error(transparent)]
    Discovery(#[from] crate::jail::DiscoveryError),

    #[error(transparent)]
    Remote(#[from] crate::remote::RemoteError),

    #[error(transparent)]
    Resolver(#[from] crate::resolve::ResolverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
