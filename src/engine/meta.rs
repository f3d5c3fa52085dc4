// ABOUTME: The deployment breadcrumb written into each target's root.
// ABOUTME: Uploaded to a temp path, then moved into place as root-owned read-only.

use super::{Shell, current_user, q};
use crate::error::Result;
use crate::jail::JailInfo;
use crate::remote::Remote;

/// Contents of one target's meta file.
#[derive(Debug)]
pub(crate) struct MetaFile<'a> {
    pub date: &'a str,
    pub group: &'a str,
    pub info: Option<&'a str>,
    pub project: &'a str,
}

impl MetaFile<'_> {
    fn render(&self, jail: &str, node: &str) -> String {
        format!(
            "---\n\
             date:     {date}\n\
             group:    {group}\n\
             info:     {info}\n\
             jail:     {jail}\n\
             node:     {node}\n\
             project:  {project}\n",
            date = self.date,
            group = self.group,
            info = self.info.unwrap_or("~"),
            jail = jail,
            node = node,
            project = self.project,
        )
    }

    /// Write the breadcrumb into `meta_path` inside the target's root:
    /// upload to a namespaced temp file under the jail's /tmp, then
    /// mv + chown 0:0 + chmod 444 on the remote side.
    pub async fn install<R: Remote + ?Sized>(
        &self,
        shell: &Shell<'_, R>,
        target: &JailInfo,
        meta_path: &str,
    ) -> Result<()> {
        let host = target.id.host();
        let content = self.render(target.id.jail(), host);
        let staged = format!(
            "{}/tmp/deploy.meta.yml.{}.{}",
            target.rootdir,
            current_user(),
            std::process::id()
        );
        let final_path = format!("{}{}", target.rootdir, meta_path);

        if shell.dry_run() {
            tracing::info!("{}: would install meta file {}", host, final_path);
            return Ok(());
        }

        let local = std::env::temp_dir().join(format!(
            "{}.meta.{}",
            env!("CARGO_PKG_NAME"),
            std::process::id()
        ));
        std::fs::write(&local, &content)?;
        let uploaded = shell.upload(host, &local, &staged).await;
        let _ = std::fs::remove_file(&local);
        uploaded?;

        shell
            .mutate(host, &format!("mv {} {}", q(&staged), q(&final_path)))
            .await?;
        shell
            .mutate(host, &format!("chown 0:0 {}", q(&final_path)))
            .await?;
        shell
            .mutate(host, &format!("chmod 444 {}", q(&final_path)))
            .await?;
        Ok(())
    }
}
