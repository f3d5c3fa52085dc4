// ABOUTME: Command module aggregator for the jroll CLI.
// ABOUTME: Re-exports deploy, restart, and show command handlers.

mod deploy;
mod restart;
mod show;

pub use deploy::deploy;
pub use restart::restart;
pub use show::show;
