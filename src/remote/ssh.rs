// ABOUTME: russh-backed transport for the whole fleet.
// ABOUTME: Sessions are established lazily per host and cached for the run.

use super::error::{RemoteError, Result};
use super::{RemoteCopy, RemoteExec, RemoteOutput};
use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::ChannelMsg;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::sync::Mutex;

/// Fleet-wide SSH settings. One set of credentials covers every host;
/// the host itself is supplied per call.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Username for authentication.
    pub user: String,
    /// SSH port (default: 22).
    pub port: u16,
    /// Optional path to private key file.
    /// If None, will try SSH agent then default key locations.
    pub key_path: Option<PathBuf>,
    /// Whether to accept unknown hosts (Trust On First Use).
    pub trust_on_first_use: bool,
    /// Optional path to known_hosts file.
    /// If None, uses the default ~/.ssh/known_hosts.
    pub known_hosts_path: Option<PathBuf>,
    /// Timeout for command execution.
    pub command_timeout: Duration,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            port: 22,
            key_path: None,
            trust_on_first_use: false,
            known_hosts_path: None,
            command_timeout: Duration::from_secs(300),
        }
    }
}

/// Host key verification handler.
struct FleetHandler {
    host: String,
    port: u16,
    trust_on_first_use: bool,
    known_hosts_path: Option<PathBuf>,
}

impl client::Handler for FleetHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let check_result = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match check_result {
            Ok(true) => Ok(true),
            Ok(false) => {
                if self.trust_on_first_use {
                    tracing::warn!(
                        "Trust-On-First-Use: accepting unknown host key for {}:{}",
                        self.host,
                        self.port
                    );
                    let learn_result = match &self.known_hosts_path {
                        Some(path) => {
                            learn_known_hosts_path(&self.host, self.port, server_public_key, path)
                        }
                        None => learn_known_hosts(&self.host, self.port, server_public_key),
                    };
                    if let Err(e) = learn_result {
                        tracing::warn!("Failed to save host key to known_hosts: {}", e);
                    }
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(russh::keys::Error::KeyChanged { .. }) => Ok(false),
            Err(_) => Ok(self.trust_on_first_use),
        }
    }
}

/// Authentication method resolved from config.
enum AuthMethod {
    Agent(AgentClient<UnixStream>),
    KeyFile(Arc<ssh_key::PrivateKey>),
}

/// One established session.
struct HostSession {
    host: String,
    handle: Handle<FleetHandler>,
}

/// Lazily-connected SSH sessions for every host touched during a run.
pub struct SshFleet {
    config: SshConfig,
    sessions: Mutex<HashMap<String, Arc<HostSession>>>,
}

impl SshFleet {
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached session for a host, connecting if needed.
    async fn session(&self, host: &str) -> Result<Arc<HostSession>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(host) {
            return Ok(Arc::clone(session));
        }

        tracing::debug!("connecting to {}:{}", host, self.config.port);
        let session = Arc::new(self.connect(host).await?);
        sessions.insert(host.to_string(), Arc::clone(&session));
        Ok(session)
    }

    async fn connect(&self, host: &str) -> Result<HostSession> {
        let auth_method = self.resolve_auth_method().await?;

        let russh_config = client::Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let handler = FleetHandler {
            host: host.to_string(),
            port: self.config.port,
            trust_on_first_use: self.config.trust_on_first_use,
            known_hosts_path: self.config.known_hosts_path.clone(),
        };

        let mut handle = client::connect(
            Arc::new(russh_config),
            (host, self.config.port),
            handler,
        )
        .await
        .map_err(|e| RemoteError::Connection {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

        if !self.authenticate(&mut handle, auth_method).await? {
            return Err(RemoteError::AuthenticationFailed {
                host: host.to_string(),
            });
        }

        Ok(HostSession {
            host: host.to_string(),
            handle,
        })
    }

    /// Resolve which authentication method to use: explicit key file,
    /// then SSH agent, then the usual ~/.ssh key locations.
    async fn resolve_auth_method(&self) -> Result<AuthMethod> {
        if let Some(key_path) = &self.config.key_path {
            let key = load_secret_key(key_path, None).map_err(|e| RemoteError::KeyLoadFailed {
                path: key_path.clone(),
                reason: e.to_string(),
            })?;
            return Ok(AuthMethod::KeyFile(Arc::new(key)));
        }

        if let Ok(agent) = AgentClient::connect_env().await {
            return Ok(AuthMethod::Agent(agent));
        }

        let home = std::env::var("HOME").map_err(|_| {
            RemoteError::AgentUnavailable("SSH agent not available and HOME not set".to_string())
        })?;

        let default_keys = [
            format!("{}/.ssh/id_ed25519", home),
            format!("{}/.ssh/id_rsa", home),
            format!("{}/.ssh/id_ecdsa", home),
        ];

        for key_path in &default_keys {
            if let Ok(key) = load_secret_key(key_path, None) {
                return Ok(AuthMethod::KeyFile(Arc::new(key)));
            }
        }

        Err(RemoteError::AgentUnavailable(
            "SSH agent not available and no default keys found".to_string(),
        ))
    }

    async fn authenticate(
        &self,
        handle: &mut Handle<FleetHandler>,
        auth_method: AuthMethod,
    ) -> Result<bool> {
        match auth_method {
            AuthMethod::Agent(mut agent) => {
                let keys = agent.request_identities().await.map_err(|e| {
                    RemoteError::AgentUnavailable(format!("failed to list agent keys: {}", e))
                })?;

                if keys.is_empty() {
                    return Err(RemoteError::AgentUnavailable(
                        "no keys in SSH agent".to_string(),
                    ));
                }

                for key in &keys {
                    match handle
                        .authenticate_publickey_with(&self.config.user, key.clone(), None, &mut agent)
                        .await
                    {
                        Ok(result) if result.success() => return Ok(true),
                        _ => continue,
                    }
                }
                Ok(false)
            }
            AuthMethod::KeyFile(key) => {
                let hash_alg = handle
                    .best_supported_rsa_hash()
                    .await
                    .map_err(RemoteError::Protocol)?
                    .flatten();

                let result = handle
                    .authenticate_publickey(
                        &self.config.user,
                        PrivateKeyWithHashAlg::new(key, hash_alg),
                    )
                    .await
                    .map_err(RemoteError::Protocol)?;

                Ok(result.success())
            }
        }
    }
}

impl HostSession {
    /// Run a command and drain the channel to completion.
    async fn exec(&self, command: &str) -> Result<RemoteOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(RemoteError::Protocol)?;

        channel
            .exec(true, command)
            .await
            .map_err(RemoteError::Protocol)?;

        self.drain(channel).await
    }

    /// Stream local bytes into `cat > remote` on the host.
    async fn upload(&self, data: &[u8], remote: &str) -> Result<RemoteOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(RemoteError::Protocol)?;

        let command = format!("cat > {}", shell_words::quote(remote));
        channel
            .exec(true, command.as_str())
            .await
            .map_err(RemoteError::Protocol)?;

        channel.data(data).await.map_err(RemoteError::Protocol)?;
        channel.eof().await.map_err(RemoteError::Protocol)?;

        self.drain(channel).await
    }

    async fn drain(&self, mut channel: russh::Channel<client::Msg>) -> Result<RemoteOutput> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = 0u32;
        let mut got_exit_status = false;
        let mut got_eof = false;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = exit_status;
                    got_exit_status = true;
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    if got_exit_status {
                        break;
                    }
                }
                Some(ChannelMsg::Close) => break,
                Some(_) => {}
                None => break,
            }
        }

        // A channel that closes without an exit status means the
        // connection died under us, not that the command failed.
        if !got_exit_status {
            return Err(RemoteError::ChannelClosed {
                host: self.host.clone(),
            });
        }

        Ok(RemoteOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        })
    }
}

#[async_trait]
impl RemoteExec for SshFleet {
    async fn exec(&self, host: &str, command: &str) -> Result<RemoteOutput> {
        let session = self.session(host).await?;
        match tokio::time::timeout(self.config.command_timeout, session.exec(command)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::CommandTimeout {
                host: host.to_string(),
                command: command.to_string(),
                timeout: self.config.command_timeout,
            }),
        }
    }
}

#[async_trait]
impl RemoteCopy for SshFleet {
    async fn copy(&self, host: &str, local: &Path, remote: &str) -> Result<()> {
        let data = std::fs::read(local).map_err(|e| RemoteError::CopyFailed {
            host: host.to_string(),
            path: local.to_path_buf(),
            reason: e.to_string(),
        })?;

        let session = self.session(host).await?;
        let output = match tokio::time::timeout(
            self.config.command_timeout,
            session.upload(&data, remote),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RemoteError::CommandTimeout {
                    host: host.to_string(),
                    command: format!("cat > {}", remote),
                    timeout: self.config.command_timeout,
                });
            }
        };

        if !output.success() {
            return Err(RemoteError::CopyFailed {
                host: host.to_string(),
                path: local.to_path_buf(),
                reason: output.captured().to_string(),
            });
        }
        Ok(())
    }
}
