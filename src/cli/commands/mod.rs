//! Command execution.
//!
//! Each command runs the pipeline it needs (configuration, environment, artifacts,
//! version, plan, upload) and reports through the [`RuntimeConfig`] output.

mod context;
mod counter;
mod plan;
mod publish;
mod version;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use counter::execute_counter;
use plan::execute_plan;
use publish::execute_publish;
use version::execute_version;

/// Execute the command, returning the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        let output = super::OutputManager::new(false, false);
        output.error(&validation_error.to_string());
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Version { .. } => execute_version(&args, &config).await,
        Command::Plan { .. } => execute_plan(&args, &config).await,
        Command::Publish { .. } => execute_publish(&args, &config).await,
        Command::Counter { .. } => execute_counter(&args, &config).await,
    };

    match result {
        Ok(()) => Ok(0),
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {}", args.command.name(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() && !config.is_quiet() {
                config.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    config.println(&format!("  • {}", suggestion));
                }
            }

            Ok(1)
        }
    }
}
