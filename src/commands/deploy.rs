// ABOUTME: Deploy command implementation.
// ABOUTME: Runs the deployment engine for each named project, in order.

use jroll::config::Config;
use jroll::engine::{DeployEngine, DeployOptions};
use jroll::error::Result;
use jroll::remote::SshFleet;

pub async fn deploy(config: &Config, projects: &[String], opts: &DeployOptions) -> Result<()> {
    let fleet = SshFleet::new(config.ssh_config());

    for name in projects {
        DeployEngine::new(&fleet, config, name)?.run(opts).await?;
    }
    Ok(())
}
