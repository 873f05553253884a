//! Version command implementation.
//!
//! Prints the version this build resolves to.

use super::context::CommandContext;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::version::{self, BuildNumber};

/// Execute version command
pub(super) async fn execute_version(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Version { dry_run } = &args.command else {
        unreachable!("execute_version called with non-Version command");
    };

    let context = CommandContext::load(&args.config, config)?;
    let spec = context.version_spec();
    let store = context.counter_store();
    let is_ci = context.environment.is_ci();

    let resolved = if *dry_run {
        version::preview(&spec, is_ci, &store).await?
    } else {
        version::resolve(&spec, is_ci, &store).await?
    };

    match resolved.build {
        BuildNumber::Dev => config.verbose_println("Local build, counter untouched"),
        BuildNumber::Issued(n) => config.verbose_println(&format!(
            "Issued build number {} for key {}",
            n,
            spec.counter_key()
        )),
        BuildNumber::Projected(n) => config.verbose_println(&format!(
            "Next build number for key {} would be {} (nothing consumed)",
            spec.counter_key(),
            n
        )),
    }

    let _ = config.output().result(&resolved.display);
    Ok(())
}
