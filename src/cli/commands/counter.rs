//! Counter command implementation.
//!
//! Lists persisted build counters.

use super::context::CommandContext;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{ReleaseError, Result};

/// Execute counter command
pub(super) async fn execute_counter(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Counter { json } = &args.command else {
        unreachable!("execute_counter called with non-Counter command");
    };

    let context = CommandContext::load(&args.config, config)?;
    let store = context.counter_store();
    let records = store.records()?;

    if *json {
        let json_output = serde_json::to_string_pretty(&records).map_err(ReleaseError::Json)?;
        let _ = config.output().result(&json_output);
        return Ok(());
    }

    if records.is_empty() {
        config.println(&format!("No build counters in {}", store.path().display()));
        return Ok(());
    }

    let _ = config
        .output()
        .section(&format!("Build counters ({})", store.path().display()));
    for (key, record) in &records {
        let _ = config.output().field(
            key.as_str(),
            &format!(
                "{} (updated {})",
                record.value,
                record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        );
    }
    Ok(())
}
