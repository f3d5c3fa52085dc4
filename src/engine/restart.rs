// ABOUTME: Restarts a cohort in place and refreshes its deployment breadcrumbs.
// ABOUTME: No snapshots move; this is stop, re-copy, re-meta, start.

use super::meta::MetaFile;
use super::{Shell, q};
use crate::config::{Config, Project};
use crate::error::Result;
use crate::jail;
use crate::remote::Remote;
use crate::resolve::{Resolver, other_group};
use crate::types::meta_date;
use chrono::Local;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RestartOptions {
    /// Restart the active group (the one NOT resolved as inactive).
    /// Requires the project to have exactly two groups.
    pub active: bool,
    pub dry_run: bool,
    /// Restart this group instead of resolving one.
    pub group: Option<String>,
}

pub struct RestartEngine<'a, R: Remote + ?Sized> {
    remote: &'a R,
    config: &'a Config,
    name: &'a str,
    project: &'a Project,
}

impl<'a, R: Remote + ?Sized> RestartEngine<'a, R> {
    pub fn new(remote: &'a R, config: &'a Config, name: &'a str) -> Result<Self> {
        let project = config.project(name)?;
        Ok(Self {
            remote,
            config,
            name,
            project,
        })
    }

    pub async fn run(&self, opts: &RestartOptions) -> Result<()> {
        let group = match &opts.group {
            Some(group) => group.clone(),
            None => {
                let inactive = Resolver::for_project(self.name, self.project)?
                    .resolve(self.config.http_timeout)
                    .await?;
                if opts.active {
                    other_group(self.name, self.project, &inactive)?
                } else {
                    inactive
                }
            }
        };
        let members = self.project.group(self.name, &group)?;
        tracing::info!(
            "restarting group '{}' of project '{}' ({} member(s))",
            group,
            self.name,
            members.len()
        );

        let shell = Shell::new(self.remote, opts.dry_run);
        let date = meta_date(Local::now());

        for member in members {
            let target = jail::inspect(self.remote, &member.id).await?;
            let host = target.id.host();

            if target.running {
                shell
                    .mutate(host, &format!("ezjail-admin stop {}", q(target.id.jail())))
                    .await?;
                // Give services inside the jail a moment to wind down.
                if !shell.dry_run() {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                }
            }

            for path in self.project.effective_copy(member) {
                shell
                    .mutate(
                        host,
                        &format!(
                            "cp {} {}",
                            q(path),
                            q(&format!("{}{}", target.rootdir, path))
                        ),
                    )
                    .await?;
            }

            if let Some(meta_path) = self.project.effective_meta(member) {
                let meta = MetaFile {
                    date: &date,
                    group: &group,
                    info: self.project.info.as_deref(),
                    project: self.name,
                };
                meta.install(&shell, &target, meta_path).await?;
            }

            if !member.halt {
                shell
                    .mutate(host, &format!("ezjail-admin start {}", q(target.id.jail())))
                    .await?;
            }
        }

        tracing::info!("group '{}' of project '{}' restarted", group, self.name);
        Ok(())
    }
}
