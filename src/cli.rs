// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Subcommands resolve by unique prefix, matching the historical CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jroll")]
#[command(about = "Blue/green deployment of ZFS-backed FreeBSD jails")]
#[command(version)]
#[command(infer_subcommands = true)]
pub struct Cli {
    /// Configuration file (default: ../etc/jroll.yml next to the executable)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy projects to their inactive group
    Deploy {
        /// Deploy into this group instead of resolving the inactive one
        #[arg(short, long, value_name = "NAME")]
        group: Option<String>,

        /// Discover and plan only; issue no mutating command
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Delete eligible snapshots even below the auto-trigger threshold
        #[arg(short = 'w', long, conflicts_with = "no_sweep")]
        sweep: bool,

        /// Leave all snapshots in place
        #[arg(short = 'W', long)]
        no_sweep: bool,

        /// Projects to deploy
        #[arg(required = true)]
        projects: Vec<String>,
    },

    /// Stop and start a group, refreshing copied files and meta
    Restart {
        /// Restart the active group (requires exactly two groups)
        #[arg(short, long)]
        active: bool,

        /// Restart this group instead of resolving one
        #[arg(short, long, value_name = "NAME")]
        group: Option<String>,

        /// Discover only; issue no mutating command
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Projects to restart
        #[arg(required = true)]
        projects: Vec<String>,
    },

    /// List projects, groups, and member states
    Show {
        /// Projects to list (default: all)
        projects: Vec<String>,
    },
}
