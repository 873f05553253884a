//! Command line interface for maven_release.

mod args;
pub mod commands;
mod output;

pub use args::{ArtifactArgs, Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
