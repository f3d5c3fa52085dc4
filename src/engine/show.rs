// ABOUTME: Read-only listing of projects, groups, and member states.
// ABOUTME: The configured inactive value prints verbatim; no HTTP is done here.

use crate::config::Config;
use crate::error::Result;
use crate::jail;
use crate::remote::RemoteExec;
use std::fmt::Write;

/// Render the listing for the named projects, or all of them when
/// `names` is empty. Groups are labeled "inactive" by literal string
/// comparison with the configured value, which may be a URL nothing
/// matches.
pub async fn render_show<R: RemoteExec + ?Sized>(
    remote: &R,
    config: &Config,
    names: &[String],
) -> Result<String> {
    let mut out = String::new();

    let selected: Vec<&String> = if names.is_empty() {
        config.projects.keys().collect()
    } else {
        names.iter().collect()
    };

    for name in selected {
        let project = config.project(name)?;
        let inactive = project.inactive.as_deref().unwrap_or("~");
        writeln!(out, "{}: inactive = {}", name, inactive).expect("string write");

        for (group, members) in &project.groups {
            let label = if group == inactive { "inactive" } else { "active" };
            writeln!(out, "  group {} ({})", group, label).expect("string write");

            for member in members {
                let info = jail::inspect(remote, &member.id).await?;
                let state = if info.running { "running" } else { "stopped" };
                writeln!(out, "    {:<24} {}", member.id.to_string(), state)
                    .expect("string write");
            }
        }
    }

    Ok(out)
}
