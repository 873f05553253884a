//! Publish command implementation.
//!
//! Loads artifacts, resolves the version, plans and uploads each entry in order.

use super::context::CommandContext;
use super::plan::print_plan;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::publish::{self, MavenRepositorySink};
use crate::version;

/// Execute publish command
///
/// Fails when any entry failed, after every entry has been attempted.
pub(super) async fn execute_publish(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Publish {
        dry_run,
        maven_pass,
        artifacts,
    } = &args.command
    else {
        unreachable!("execute_publish called with non-Publish command");
    };

    let context = CommandContext::load(&args.config, config)?;
    // Artifacts are checked before the counter is touched
    let artifacts = context.artifacts(artifacts.to_paths()).await?;
    let spec = context.version_spec();
    let is_ci = context.environment.is_ci();
    let store = context.counter_store();

    let resolved = if *dry_run {
        version::preview(&spec, is_ci, &store).await?
    } else {
        version::resolve(&spec, is_ci, &store).await?
    };
    let _ = config.output().info(&format!("Resolved version {}", resolved));

    let planner = context.planner();
    let plan = planner.plan(&resolved, &spec, is_ci, &artifacts)?;
    print_plan(config, &plan, planner.snapshot_mode());

    if *dry_run {
        config.success_println("Dry run complete, nothing uploaded");
        return Ok(());
    }

    let repository = &context.settings.repository;
    let sink = MavenRepositorySink::new(repository.url.clone(), repository.timeout)?;
    let environment = context.environment.clone().with_password(maven_pass.clone());
    let credentials = environment.credentials(&repository.username);
    if credentials.is_none() {
        config.warning_println(&format!(
            "{} is not set, uploading to {} anonymously",
            repository.password_env, repository.url
        ));
    }

    let _ = config.output().section("Uploading");
    let report = publish::publish(&plan, &sink, credentials.as_ref(), repository.timeout).await;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => config.success_println(&format!(
                "{} {} uploaded",
                outcome.name, outcome.version
            )),
            Err(e) => config.error_println(&format!(
                "{} {} failed: {}",
                outcome.name, outcome.version, e.cause
            )),
        }
    }

    report.ensure_success()?;
    config.success_println(&format!(
        "Published {} publication(s) of {}",
        report.uploaded().count(),
        plan.coordinates
    ));
    Ok(())
}
