// ABOUTME: Jail and dataset discovery over the remote transport.
// ABOUTME: Builds a JailInfo from ezjail config, mount table, snapshot list, and jail status.

use crate::remote::{RemoteError, RemoteExec, exec_checked};
use crate::types::JailId;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read ezjail config for {jail} on {host}: {output}")]
    ConfigUnreadable {
        jail: String,
        host: String,
        output: String,
    },

    #[error("jail {jail} on {host} has no '{attr}' attribute")]
    MissingAttribute {
        jail: String,
        host: String,
        attr: &'static str,
    },

    #[error("no zfs filesystem mounted at {rootdir} on {host}")]
    RootFsNotFound { host: String, rootdir: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Everything the engines need to know about one jail, discovered
/// fresh at the start of each operation.
#[derive(Debug, Clone)]
pub struct JailInfo {
    pub id: JailId,
    /// Filesystem mount point of the jail root.
    pub rootdir: String,
    /// ZFS dataset backing the jail root.
    pub rootfs: String,
    pub ip: String,
    pub hostname: String,
    /// Snapshot suffixes, newest first.
    pub snapshots: Vec<String>,
    pub snapshot_set: HashSet<String>,
    pub running: bool,
}

impl JailInfo {
    pub fn has_snapshot(&self, suffix: &str) -> bool {
        self.snapshot_set.contains(suffix)
    }
}

/// Discover a jail's state on its host.
pub async fn inspect<R: RemoteExec + ?Sized>(
    remote: &R,
    id: &JailId,
) -> Result<JailInfo, DiscoveryError> {
    let host = id.host();
    let safe = id.safe_jail();

    let config = remote
        .exec(host, &format!("cat /usr/local/etc/ezjail/{}", safe))
        .await?;
    if !config.success() {
        return Err(DiscoveryError::ConfigUnreadable {
            jail: id.jail().to_string(),
            host: host.to_string(),
            output: config.captured().to_string(),
        });
    }

    let attrs = parse_ezjail_config(&safe, &config.stdout);
    let rootdir = attrs
        .get("rootdir")
        .cloned()
        .ok_or_else(|| DiscoveryError::MissingAttribute {
            jail: id.jail().to_string(),
            host: host.to_string(),
            attr: "rootdir",
        })?;
    let ip = attrs.get("ip").cloned().unwrap_or_default();
    let hostname = attrs.get("hostname").cloned().unwrap_or_default();

    let mounts = exec_checked(remote, host, "mount -ptzfs").await?;
    let rootfs = find_rootfs(&mounts.stdout, &rootdir).ok_or_else(|| {
        DiscoveryError::RootFsNotFound {
            host: host.to_string(),
            rootdir: rootdir.clone(),
        }
    })?;

    let listing = exec_checked(
        remote,
        host,
        &format!("zfs list -Hrt snapshot -oname {}", rootfs),
    )
    .await?;
    // zfs lists oldest first; the engines want newest first.
    let mut snapshots = parse_snapshot_list(&rootfs, &listing.stdout);
    snapshots.reverse();
    let snapshot_set: HashSet<String> = snapshots.iter().cloned().collect();

    let jails = exec_checked(remote, host, "ezjail-admin list").await?;
    let running = parse_running(&jails.stdout, &ip, &hostname);

    Ok(JailInfo {
        id: id.clone(),
        rootdir,
        rootfs,
        ip,
        hostname,
        snapshots,
        snapshot_set,
        running,
    })
}

/// Parse `export jail_<safe>_<key>="<value>"` lines. The ip value may
/// carry a leading `<interface>|` token, which is stripped.
fn parse_ezjail_config(safe: &str, content: &str) -> HashMap<String, String> {
    let pattern = format!(
        r#"^\s*export\s+jail_{}_(\w+)="([^"]+)"\s*$"#,
        regex::escape(safe)
    );
    let re = Regex::new(&pattern).expect("escaped jail name yields a valid pattern");

    let mut attrs = HashMap::new();
    for line in content.lines() {
        if let Some(caps) = re.captures(line) {
            let key = caps[1].to_string();
            let mut value = caps[2].to_string();
            if key == "ip"
                && let Some((_, addr)) = value.split_once('|')
            {
                value = addr.to_string();
            }
            attrs.insert(key, value);
        }
    }
    attrs
}

/// First two whitespace-separated tokens of each `mount -ptzfs` line
/// are `<fs> <mountpoint>`; return the fs mounted at `rootdir`.
fn find_rootfs(mounts: &str, rootdir: &str) -> Option<String> {
    for line in mounts.lines() {
        let mut tokens = line.split_whitespace();
        if let (Some(fs), Some(mountpoint)) = (tokens.next(), tokens.next())
            && mountpoint == rootdir
        {
            return Some(fs.to_string());
        }
    }
    None
}

/// Strip the `<dataset>@` prefix from each `zfs list` line. Snapshots
/// of child datasets (the listing is recursive) are skipped.
fn parse_snapshot_list(rootfs: &str, listing: &str) -> Vec<String> {
    let prefix = format!("{}@", rootfs);
    listing
        .lines()
        .filter_map(|line| line.trim().strip_prefix(&prefix))
        .map(|suffix| suffix.to_string())
        .collect()
}

/// Find this jail's row in `ezjail-admin list` output: columns 3 and 4
/// are IP and hostname, column 1's state contains 'R' iff running.
fn parse_running(listing: &str, ip: &str, hostname: &str) -> bool {
    if ip.is_empty() && hostname.is_empty() {
        return false;
    }
    for line in listing.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() >= 5 && cols[2] == ip && cols[3] == hostname {
            return cols[0].contains('R');
        }
    }
    false
}
