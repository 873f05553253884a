//! Plan command implementation.
//!
//! Shows what a publish would upload. The counter is read, never advanced.

use super::context::CommandContext;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{ReleaseError, Result};
use crate::publish::{PlanSummary, PublicationPlan, SnapshotMode, paths};
use crate::version::{self, ResolvedVersion};
use serde::Serialize;

/// JSON shape of `plan --json`
#[derive(Serialize)]
struct PlanOutput<'a> {
    resolved: &'a ResolvedVersion,
    snapshot_mode: SnapshotMode,
    plan: PlanSummary,
}

/// Execute plan command
pub(super) async fn execute_plan(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Plan { json, artifacts } = &args.command else {
        unreachable!("execute_plan called with non-Plan command");
    };

    let context = CommandContext::load(&args.config, config)?;
    let artifacts = context.artifacts(artifacts.to_paths()).await?;
    let spec = context.version_spec();
    let is_ci = context.environment.is_ci();
    let resolved = version::preview(&spec, is_ci, &context.counter_store()).await?;
    let planner = context.planner();
    let plan = planner.plan(&resolved, &spec, is_ci, &artifacts)?;

    if *json {
        let output = PlanOutput {
            resolved: &resolved,
            snapshot_mode: planner.snapshot_mode(),
            plan: plan.summary(),
        };
        let json_output = serde_json::to_string_pretty(&output).map_err(ReleaseError::Json)?;
        let _ = config.output().result(&json_output);
    } else {
        print_plan(config, &plan, planner.snapshot_mode());
    }
    Ok(())
}

/// Human-readable plan listing, shared with `publish --dry-run`
pub(super) fn print_plan(config: &RuntimeConfig, plan: &PublicationPlan, mode: SnapshotMode) {
    let output = config.output();
    let _ = output.section(&format!("Publication plan for {}", plan.coordinates));
    let _ = output.field("snapshots", &mode.to_string());

    for entry in &plan.entries {
        let detail = match entry.artifacts() {
            Some(set) => format!("{} bytes of archives", set.total_len()),
            None => "descriptor only, depends on main".to_string(),
        };
        let _ = output.field(
            &entry.name.to_string(),
            &format!("{} ({})", entry.version, detail),
        );

        if config.is_verbose() {
            // The descriptor body does not affect paths
            for file in paths::publication_files(&plan.coordinates, entry, String::new()) {
                config.indent(&file.path);
            }
        }
    }
}
