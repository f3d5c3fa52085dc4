// ABOUTME: Test support utilities.
// ABOUTME: An in-memory fleet that simulates ezjail/zfs hosts behind the remote traits.

// Each test binary only uses part of this module, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use jroll::config::Config;
use jroll::remote::{RemoteCopy, RemoteError, RemoteExec, RemoteOutput};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Parse a YAML config for a test.
pub fn config(yaml: &str) -> Config {
    Config::from_yaml(yaml).expect("test config parses")
}

/// The delta stream carried by a simulated dump file.
#[derive(Debug, Clone)]
struct DumpStream {
    /// Snapshot suffixes to append on receive, oldest first.
    delta: Vec<String>,
}

/// Simulated state of one remote host.
#[derive(Debug, Default)]
struct HostState {
    /// ezjail config file content, keyed by sanitized jail name.
    ezjail_configs: HashMap<String, String>,
    /// (dataset, mountpoint) pairs reported by `mount -ptzfs`.
    mounts: Vec<(String, String)>,
    /// Snapshot suffixes per dataset, oldest first (zfs listing order).
    snapshots: HashMap<String, Vec<String>>,
    /// Rows of `ezjail-admin list` output.
    jail_rows: Vec<String>,
    /// Dump files present on this host.
    dumps: HashMap<String, DumpStream>,
    /// Plain text files uploaded or moved into place.
    texts: HashMap<String, String>,
}

/// An in-memory fleet implementing the remote traits. Read commands
/// answer from the simulated state; mutating commands update it and
/// are recorded for assertions.
#[derive(Default)]
pub struct FakeFleet {
    hosts: Mutex<HashMap<String, HostState>>,
    mutations: Mutex<Vec<(String, String)>>,
}

fn ok(stdout: impl Into<String>) -> RemoteOutput {
    RemoteOutput {
        exit_code: 0,
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

fn fail(stderr: impl Into<String>) -> RemoteOutput {
    RemoteOutput {
        exit_code: 1,
        stdout: String::new(),
        stderr: stderr.into(),
    }
}

fn split_at_sign(token: &str) -> (String, String) {
    let (ds, snap) = token
        .split_once('@')
        .unwrap_or_else(|| panic!("expected dataset@snapshot, got '{token}'"));
    (ds.to_string(), snap.to_string())
}

impl FakeFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a jail on a host. `snapshots` is oldest first, the order
    /// `zfs list` reports.
    #[allow(clippy::too_many_arguments)]
    pub fn add_jail(
        &self,
        host: &str,
        jail: &str,
        ip: &str,
        hostname: &str,
        rootdir: &str,
        rootfs: &str,
        running: bool,
        snapshots: &[&str],
    ) {
        let safe: String = jail
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let config = format!(
            "export jail_{safe}_hostname=\"{hostname}\"\n\
             export jail_{safe}_ip=\"{ip}\"\n\
             export jail_{safe}_rootdir=\"{rootdir}\"\n"
        );

        let mut hosts = self.hosts.lock().unwrap();
        let state = hosts.entry(host.to_string()).or_default();
        state.ezjail_configs.insert(safe, config);
        state
            .mounts
            .push((rootfs.to_string(), rootdir.to_string()));
        state.snapshots.insert(
            rootfs.to_string(),
            snapshots.iter().map(|s| s.to_string()).collect(),
        );
        let sta = if running { "ZR" } else { "ZS" };
        let jid = if running { "1" } else { "N/A" };
        state
            .jail_rows
            .push(format!("{sta}  {jid}  {ip}  {hostname}  {rootdir}"));
    }

    /// Seed a host with a verbatim ezjail config file, for discovery
    /// edge cases the builder above cannot express.
    pub fn add_raw_config(&self, host: &str, safe: &str, content: &str) {
        let mut hosts = self.hosts.lock().unwrap();
        let state = hosts.entry(host.to_string()).or_default();
        state
            .ezjail_configs
            .insert(safe.to_string(), content.to_string());
    }

    /// Register a dataset mount without a jail config.
    pub fn add_mount(&self, host: &str, rootfs: &str, rootdir: &str) {
        let mut hosts = self.hosts.lock().unwrap();
        let state = hosts.entry(host.to_string()).or_default();
        state
            .mounts
            .push((rootfs.to_string(), rootdir.to_string()));
    }

    /// Snapshot suffixes of a dataset, oldest first.
    pub fn snapshots(&self, host: &str, dataset: &str) -> Vec<String> {
        let hosts = self.hosts.lock().unwrap();
        hosts[host].snapshots[dataset].clone()
    }

    /// Dump file paths currently present on a host.
    pub fn dumps_on(&self, host: &str) -> Vec<String> {
        let hosts = self.hosts.lock().unwrap();
        let mut paths: Vec<String> = hosts[host].dumps.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Content of a text file on a host, if present.
    pub fn text(&self, host: &str, path: &str) -> Option<String> {
        let hosts = self.hosts.lock().unwrap();
        hosts.get(host)?.texts.get(path).cloned()
    }

    /// Every mutating command issued, in order.
    pub fn mutations(&self) -> Vec<(String, String)> {
        self.mutations.lock().unwrap().clone()
    }

    /// Mutating commands issued on one host, in order.
    pub fn mutations_on(&self, host: &str) -> Vec<String> {
        self.mutations
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| c.clone())
            .collect()
    }

    fn dispatch(&self, host: &str, command: &str) -> RemoteOutput {
        let argv: Vec<String> = command
            .split_whitespace()
            .map(|t| t.trim_matches('\'').to_string())
            .collect();
        let mut hosts = self.hosts.lock().unwrap();
        let state = hosts
            .get_mut(host)
            .unwrap_or_else(|| panic!("command for unknown host '{host}': {command}"));

        // <decompress filter> < <dump> | zfs recv <dataset>
        if command.contains("| zfs recv") {
            let lt = argv.iter().position(|t| t == "<").expect("redirect in recv");
            let dump = argv[lt + 1].clone();
            let dataset = argv.last().unwrap().clone();
            return Self::receive(state, host, &dump, &dataset);
        }

        match argv[0].as_str() {
            "cat" => {
                let safe = argv[1].rsplit('/').next().unwrap();
                match state.ezjail_configs.get(safe) {
                    Some(content) => ok(content.clone()),
                    None => fail(format!("cat: {}: No such file or directory", argv[1])),
                }
            }
            "mount" => {
                let lines: String = state
                    .mounts
                    .iter()
                    .map(|(fs, mp)| format!("{fs} {mp} zfs rw\n"))
                    .collect();
                ok(lines)
            }
            "ezjail-admin" => match argv[1].as_str() {
                "list" => {
                    let mut out = String::from(
                        "STA JID  IP  Hostname  Root Directory\n--- ---- --- --------- --------------\n",
                    );
                    for row in &state.jail_rows {
                        out.push_str(row);
                        out.push('\n');
                    }
                    ok(out)
                }
                "stop" | "start" => ok(""),
                other => panic!("unhandled ezjail-admin subcommand '{other}'"),
            },
            "zfs" => self.dispatch_zfs(state, host, command, &argv),
            "stat" => {
                let path = argv[3].as_str();
                if state.dumps.contains_key(path) {
                    ok("123456\n")
                } else {
                    fail(format!("stat: {path}: No such file or directory"))
                }
            }
            "scp" => {
                let source = argv[1].as_str();
                let Some(stream) = state.dumps.get(source).cloned() else {
                    return fail(format!("scp: {source}: No such file or directory"));
                };
                let (dest_host, dest_path) = argv[2]
                    .split_once(':')
                    .expect("scp destination is host:path");
                let dest_host = dest_host.to_string();
                let dest_path = dest_path.to_string();
                drop(hosts);
                let mut hosts = self.hosts.lock().unwrap();
                hosts
                    .entry(dest_host)
                    .or_default()
                    .dumps
                    .insert(dest_path, stream);
                ok("")
            }
            "find" | "cp" | "chown" | "chmod" => ok(""),
            "mv" => {
                if let Some(text) = state.texts.remove(argv[1].as_str()) {
                    state.texts.insert(argv[2].clone(), text);
                }
                ok("")
            }
            "rm" => {
                let path = argv.last().unwrap();
                state.dumps.remove(path);
                state.texts.remove(path);
                ok("")
            }
            other => panic!("unhandled command on {host}: {other}: {command}"),
        }
    }

    fn dispatch_zfs(
        &self,
        state: &mut HostState,
        host: &str,
        command: &str,
        argv: &[String],
    ) -> RemoteOutput {
        match argv[1].as_str() {
            "list" => {
                let dataset = argv[5].as_str();
                let Some(snaps) = state.snapshots.get(dataset) else {
                    return fail(format!("cannot open '{dataset}': dataset does not exist"));
                };
                let lines: String = snaps
                    .iter()
                    .map(|s| format!("{dataset}@{s}\n"))
                    .collect();
                ok(lines)
            }
            "snapshot" => {
                let (dataset, snap) = split_at_sign(&argv[2]);
                state
                    .snapshots
                    .get_mut(&dataset)
                    .unwrap_or_else(|| panic!("snapshot of unknown dataset {dataset}"))
                    .push(snap);
                ok("")
            }
            "send" => {
                // zfs send -I @<base> <ds>@<snap> [| filter] > <dump>
                let base = argv[3].trim_start_matches('@').to_string();
                let (dataset, snap) = split_at_sign(&argv[4]);
                let dump = argv.last().unwrap().clone();
                let snaps = &state.snapshots[&dataset];
                let Some(base_idx) = snaps.iter().position(|s| *s == base) else {
                    return fail(format!("incremental source @{base} does not exist"));
                };
                let snap_idx = snaps
                    .iter()
                    .position(|s| *s == snap)
                    .unwrap_or_else(|| panic!("send of unknown snapshot {snap}"));
                let delta = snaps[base_idx + 1..=snap_idx].to_vec();
                state.dumps.insert(dump, DumpStream { delta });
                ok("")
            }
            "rollback" => {
                let (dataset, snap) = split_at_sign(&argv[3]);
                let snaps = state
                    .snapshots
                    .get_mut(&dataset)
                    .unwrap_or_else(|| panic!("rollback of unknown dataset {dataset}"));
                let idx = snaps
                    .iter()
                    .position(|s| *s == snap)
                    .unwrap_or_else(|| panic!("rollback to unknown snapshot {snap}"));
                snaps.truncate(idx + 1);
                ok("")
            }
            "recv" => {
                // zfs recv <dataset> < <dump>
                let dataset = argv[2].clone();
                let dump = argv[4].clone();
                Self::receive(state, host, &dump, &dataset)
            }
            "destroy" => {
                let (dataset, snap) = split_at_sign(&argv[2]);
                let snaps = state
                    .snapshots
                    .get_mut(&dataset)
                    .unwrap_or_else(|| panic!("destroy on unknown dataset {dataset}"));
                match snaps.iter().position(|s| *s == snap) {
                    Some(idx) => {
                        snaps.remove(idx);
                        ok("")
                    }
                    None => fail(format!("could not find any snapshots to destroy matching {snap}")),
                }
            }
            other => panic!("unhandled zfs subcommand on {host}: {other}: {command}"),
        }
    }

    fn receive(state: &mut HostState, host: &str, dump: &str, dataset: &str) -> RemoteOutput {
        let Some(stream) = state.dumps.get(dump).cloned() else {
            return fail(format!("cannot open {dump} on {host}"));
        };
        let snaps = state
            .snapshots
            .get_mut(dataset)
            .unwrap_or_else(|| panic!("recv into unknown dataset {dataset}"));
        snaps.extend(stream.delta.iter().cloned());
        ok("")
    }
}

fn is_read(command: &str) -> bool {
    command.starts_with("cat ")
        || command == "mount -ptzfs"
        || command == "ezjail-admin list"
        || command.starts_with("zfs list ")
        || command.starts_with("stat ")
}

#[async_trait]
impl RemoteExec for FakeFleet {
    async fn exec(&self, host: &str, command: &str) -> Result<RemoteOutput, RemoteError> {
        if !is_read(command) {
            self.mutations
                .lock()
                .unwrap()
                .push((host.to_string(), command.to_string()));
        }
        Ok(self.dispatch(host, command))
    }
}

#[async_trait]
impl RemoteCopy for FakeFleet {
    async fn copy(&self, host: &str, local: &Path, remote: &str) -> Result<(), RemoteError> {
        let content = std::fs::read_to_string(local).map_err(RemoteError::Io)?;
        self.mutations
            .lock()
            .unwrap()
            .push((host.to_string(), format!("upload {remote}")));
        let mut hosts = self.hosts.lock().unwrap();
        hosts
            .entry(host.to_string())
            .or_default()
            .texts
            .insert(remote.to_string(), content);
        Ok(())
    }
}
