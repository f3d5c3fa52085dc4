// ABOUTME: Entry point for the jroll CLI application.
// ABOUTME: Parses arguments and dispatches to the deploy, restart, and show commands.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use jroll::config::Config;
use jroll::engine::{DeployOptions, RestartOptions};
use jroll::error::{Error, Result};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // All diagnostics go to stderr; stdout is reserved for `show`.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let started = Instant::now();
    match run(cli).await {
        Ok(()) => {
            tracing::info!("elapsed {} seconds", started.elapsed().as_secs());
        }
        Err(e) => handle_error(e),
    }
}

/// Report the failure and exit with a kind-specific status.
fn handle_error(e: Error) -> ! {
    tracing::error!("{e}");
    let code = match &e {
        Error::Usage(_) => 2,
        Error::ConfigNotFound(_) | Error::Yaml(_) => 3,
        Error::UnknownProject(_) | Error::UnknownGroup { .. } => 4,
        Error::Discovery(_) => 5,
        Error::Resolver(_) => 6,
        Error::NoCommonBase { .. } => 7,
        Error::Remote(_) => 8,
        _ => 1,
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&path)?;

    match cli.command {
        Commands::Deploy {
            group,
            dry_run,
            sweep,
            no_sweep,
            projects,
        } => {
            let opts = DeployOptions {
                group,
                dry_run,
                sweep,
                no_sweep,
            };
            commands::deploy(&config, &projects, &opts).await
        }
        Commands::Restart {
            active,
            group,
            dry_run,
            projects,
        } => {
            let opts = RestartOptions {
                active,
                dry_run,
                group,
            };
            commands::restart(&config, &projects, &opts).await
        }
        Commands::Show { projects } => commands::show(&config, &projects).await,
    }
}
