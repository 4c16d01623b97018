//! Command line interface for clib_release.
//!
//! Parses arguments, builds the run context from the GitHub Actions
//! environment and dispatches to one command per workflow trigger.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
