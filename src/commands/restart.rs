// ABOUTME: Restart command implementation.
// ABOUTME: Runs the restart engine for each named project, in order.

use jroll::config::Config;
use jroll::engine::{RestartEngine, RestartOptions};
use jroll::error::Result;
use jroll::remote::SshFleet;

pub async fn restart(config: &Config, projects: &[String], opts: &RestartOptions) -> Result<()> {
    let fleet = SshFleet::new(config.ssh_config());

    for name in projects {
        RestartEngine::new(&fleet, config, name)?.run(opts).await?;
    }
    Ok(())
}
