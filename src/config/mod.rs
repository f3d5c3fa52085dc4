// ABOUTME: Configuration types and parsing for jroll.yml.
// ABOUTME: A YAML tree of projects plus fleet-wide SSH and timeout settings.

mod project;

pub use project::{Member, Project};

use crate::error::{Error, Result};
use crate::remote::SshConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "jroll.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub projects: BTreeMap<String, Project>,

    #[serde(default)]
    pub ssh: SshSection,

    /// Timeout for resolver HTTP requests.
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub http_timeout: Duration,

    /// Timeout for a single remote command.
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

/// Fleet-wide SSH settings from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct SshSection {
    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub key: Option<PathBuf>,

    #[serde(default)]
    pub trust_first_connection: bool,

    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
}

fn default_user() -> String {
    "root".to_string()
}

fn default_port() -> u16 {
    22
}

impl Default for SshSection {
    fn default() -> Self {
        Self {
            user: default_user(),
            port: default_port(),
            key: None,
            trust_first_connection: false,
            known_hosts: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Default config location: `../etc/jroll.yml` next to the executable.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| {
                exe.parent()
                    .map(|dir| dir.join("..").join("etc").join(CONFIG_FILENAME))
            })
            .unwrap_or_else(|| PathBuf::from("../etc").join(CONFIG_FILENAME))
    }

    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .get(name)
            .ok_or_else(|| Error::UnknownProject(name.to_string()))
    }

    /// Transport settings for the SSH fleet.
    pub fn ssh_config(&self) -> SshConfig {
        SshConfig {
            user: self.ssh.user.clone(),
            port: self.ssh.port,
            key_path: self.ssh.key.clone(),
            trust_on_first_use: self.ssh.trust_first_connection,
            known_hosts_path: self.ssh.known_hosts.clone(),
            command_timeout: self.command_timeout,
        }
    }
}
