// ABOUTME: The deployment pipeline for one project.
// ABOUTME: Discover, pick a base, snapshot the super, fan the delta out, sweep.

use super::meta::MetaFile;
use super::{Shell, dump_path, q};
use crate::config::{Config, Member, Project};
use crate::error::{Error, Result};
use crate::jail::{self, JailInfo};
use crate::plan::{PillarPlan, SweepMode, plan_pillars, plan_sweep};
use crate::remote::Remote;
use crate::resolve::Resolver;
use crate::types::{meta_date, snapshot_name};
use chrono::Local;

#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Deploy into this group instead of resolving the inactive one.
    pub group: Option<String>,
    /// Discover and plan, but issue no mutating command.
    pub dry_run: bool,
    /// Force deletion of eligible snapshots.
    pub sweep: bool,
    /// Leave all snapshots in place.
    pub no_sweep: bool,
}

pub struct DeployEngine<'a, R: Remote + ?Sized> {
    remote: &'a R,
    config: &'a Config,
    name: &'a str,
    project: &'a Project,
}

impl<'a, R: Remote + ?Sized> DeployEngine<'a, R> {
    pub fn new(remote: &'a R, config: &'a Config, name: &'a str) -> Result<Self> {
        let project = config.project(name)?;
        Ok(Self {
            remote,
            config,
            name,
            project,
        })
    }

    pub async fn run(&self, opts: &DeployOptions) -> Result<()> {
        if opts.sweep && opts.no_sweep {
            return Err(Error::Usage(
                "--sweep and --no-sweep are mutually exclusive".to_string(),
            ));
        }

        // Resolve the target group.
        let group = match &opts.group {
            Some(group) => group.clone(),
            None => {
                Resolver::for_project(self.name, self.project)?
                    .resolve(self.config.http_timeout)
                    .await?
            }
        };
        let members = self.project.group(self.name, &group)?;
        tracing::info!(
            "deploying project '{}' into group '{}' ({} member(s))",
            self.name,
            group,
            members.len()
        );

        // Discover the super and every target; plan pillars.
        let shell = Shell::new(self.remote, opts.dry_run);
        let sup = jail::inspect(self.remote, &self.project.super_jail).await?;
        let mut targets = Vec::with_capacity(members.len());
        for member in members {
            targets.push(jail::inspect(self.remote, &member.id).await?);
        }
        let pillars = plan_pillars(
            &self.project.super_jail,
            &self.project.dc,
            members.iter().map(|m| (&m.id, m.dc.as_str())),
        );

        // Freshest super snapshot present on every target.
        let base = sup
            .snapshots
            .iter()
            .find(|snap| targets.iter().all(|t| t.has_snapshot(snap)))
            .cloned()
            .ok_or_else(|| Error::NoCommonBase {
                project: self.name.to_string(),
            })?;
        tracing::info!("base snapshot: {}@{}", sup.rootfs, base);

        // Sweep plans, one per target, before anything mutates.
        let mode = SweepMode::from_flags(opts.sweep, opts.no_sweep);
        let sweeps: Vec<Vec<String>> = members
            .iter()
            .zip(&targets)
            .map(|(member, target)| {
                plan_sweep(
                    &target.snapshots,
                    &base,
                    self.project.effective_keep(member),
                    mode,
                )
            })
            .collect();

        let now = Local::now();
        let snapshot = snapshot_name(now);
        let dump = dump_path(self.name);

        self.snapshot_super(&shell, &sup, &snapshot).await?;
        self.dump_delta(&shell, &sup, &base, &snapshot, &dump).await?;

        let date = meta_date(now);
        for (index, (member, target)) in members.iter().zip(&targets).enumerate() {
            self.deploy_member(
                &shell, member, target, &pillars, index, &base, &group, &date, &dump,
                &sweeps[index],
            )
            .await?;
        }

        // Reap the dump from every pillar host.
        for entry in pillars.dcs.values() {
            shell
                .mutate(entry.pillar.host(), &format!("rm -f {}", q(&dump)))
                .await?;
        }

        tracing::info!("project '{}' deployed to group '{}'", self.name, group);
        Ok(())
    }

    /// Stop the super and purge its clean directories, snapshot the
    /// dataset, then bring the super back up. When nothing is cleaned
    /// the super keeps running throughout.
    async fn snapshot_super(
        &self,
        shell: &Shell<'_, R>,
        sup: &JailInfo,
        snapshot: &str,
    ) -> Result<()> {
        let host = sup.id.host();
        let quiesce = !self.project.clean.is_empty();

        if quiesce {
            shell
                .mutate(host, &format!("ezjail-admin stop {}", q(sup.id.jail())))
                .await?;
            for dir in &self.project.clean {
                let path = format!("{}{}", sup.rootdir, dir);
                shell
                    .mutate(host, &format!("find {} -type f -delete", q(&path)))
                    .await?;
            }
        }

        shell
            .mutate(
                host,
                &format!("zfs snapshot {}", q(&format!("{}@{}", sup.rootfs, snapshot))),
            )
            .await?;
        tracing::info!("created snapshot {}@{}", sup.rootfs, snapshot);

        if quiesce {
            shell
                .mutate(host, &format!("ezjail-admin start {}", q(sup.id.jail())))
                .await?;
        }
        Ok(())
    }

    /// Write the incremental stream from base to the new snapshot into
    /// the dump file on the super host, optionally compressed.
    async fn dump_delta(
        &self,
        shell: &Shell<'_, R>,
        sup: &JailInfo,
        base: &str,
        snapshot: &str,
        dump: &str,
    ) -> Result<()> {
        let host = sup.id.host();
        let send = format!(
            "zfs send -I @{} {}",
            q(base),
            q(&format!("{}@{}", sup.rootfs, snapshot))
        );
        let command = match &self.project.compress {
            Some(filter) => format!("{} | {} > {}", send, filter, q(dump)),
            None => format!("{} > {}", send, q(dump)),
        };
        shell.mutate(host, &command).await?;

        if !shell.dry_run() {
            let stat = shell
                .read(host, &format!("stat -f %z {}", q(dump)))
                .await?;
            tracing::info!("dump {} is {} bytes", dump, stat.stdout.trim());
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn deploy_member(
        &self,
        shell: &Shell<'_, R>,
        member: &Member,
        target: &JailInfo,
        pillars: &PillarPlan,
        index: usize,
        base: &str,
        group: &str,
        date: &str,
        dump: &str,
        sweep: &[String],
    ) -> Result<()> {
        let host = target.id.host();
        tracing::info!("deploying {}", target.id);

        // Pull the dump from the member's pillar when it lives elsewhere.
        let pillar = &pillars.assignments[index];
        if pillar.host() != host {
            shell
                .mutate(
                    pillar.host(),
                    &format!("scp {} {}:{}", q(dump), q(host), q(dump)),
                )
                .await?;
        }

        if target.running {
            shell
                .mutate(host, &format!("ezjail-admin stop {}", q(target.id.jail())))
                .await?;
        }

        shell
            .mutate(
                host,
                &format!(
                    "zfs rollback -r {}",
                    q(&format!("{}@{}", target.rootfs, base))
                ),
            )
            .await?;

        let recv = match &self.project.decompress {
            Some(filter) => format!("{} < {} | zfs recv {}", filter, q(dump), q(&target.rootfs)),
            None => format!("zfs recv {} < {}", q(&target.rootfs), q(dump)),
        };
        shell.mutate(host, &recv).await?;

        // Refresh the host's own files inside the jail root.
        for path in self.project.effective_copy(member) {
            shell
                .mutate(
                    host,
                    &format!("cp {} {}", q(path), q(&format!("{}{}", target.rootdir, path))),
                )
                .await?;
        }

        if let Some(meta_path) = self.project.effective_meta(member) {
            let meta = MetaFile {
                date,
                group,
                info: self.project.info.as_deref(),
                project: self.name,
            };
            meta.install(shell, target, meta_path).await?;
        }

        if !member.halt {
            shell
                .mutate(host, &format!("ezjail-admin start {}", q(target.id.jail())))
                .await?;
        }

        if !pillars.is_pillar(&target.id) {
            shell.mutate(host, &format!("rm -f {}", q(dump))).await?;
        }

        for snap in sweep {
            shell
                .mutate(
                    host,
                    &format!(
                        "zfs destroy {}",
                        q(&format!("{}@{}", target.rootfs, snap))
                    ),
                )
                .await?;
        }

        Ok(())
    }
}
