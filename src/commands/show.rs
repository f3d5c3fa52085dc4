// ABOUTME: Show command implementation.
// ABOUTME: Prints the project listing produced by the show engine.

use jroll::config::Config;
use jroll::engine::render_show;
use jroll::error::Result;
use jroll::remote::SshFleet;

pub async fn show(config: &Config, projects: &[String]) -> Result<()> {
    let fleet = SshFleet::new(config.ssh_config());

    let listing = render_show(&fleet, config, projects).await?;
    print!("{listing}");
    Ok(())
}
