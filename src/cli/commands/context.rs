//! Inputs shared by every command, loaded once per run.

use crate::artifact::{ArtifactPaths, ArtifactSet};
use crate::cli::RuntimeConfig;
use crate::config::{Environment, ReleaseSettings};
use crate::counter::FileCounterStore;
use crate::error::Result;
use crate::publish::{Coordinates, Planner};
use crate::version::VersionSpec;
use std::path::Path;

/// Settings and environment for one invocation
pub(super) struct CommandContext {
    /// Parsed `release.toml`
    pub settings: ReleaseSettings,
    /// Environment captured at startup
    pub environment: Environment,
}

impl CommandContext {
    /// Load the configuration file, then capture the environment
    pub fn load(config_path: &Path, config: &RuntimeConfig) -> Result<Self> {
        config.verbose_println(&format!("Loading {}", config_path.display()));
        let settings = ReleaseSettings::load(config_path)?;
        let environment =
            Environment::capture(&settings.ci, &settings.repository.password_env);

        log::debug!("Captured {:?}", environment);
        if environment.is_ci() {
            config.verbose_println(&format!(
                "CI build detected ({}={})",
                settings.ci.build_var,
                environment.build_id.as_deref().unwrap_or_default()
            ));
        } else {
            config.verbose_println(&format!(
                "No {} set, resolving a local dev version",
                settings.ci.build_var
            ));
        }

        Ok(Self {
            settings,
            environment,
        })
    }

    /// Version components and branch for this run
    pub fn version_spec(&self) -> VersionSpec {
        VersionSpec::from_inputs(&self.settings.version, &self.environment)
    }

    /// Counter store from `[counter]`
    pub fn counter_store(&self) -> FileCounterStore {
        FileCounterStore::from_settings(&self.settings.counter)
    }

    /// Planner for `[project]` and `[publication]`
    pub fn planner(&self) -> Planner {
        let project = &self.settings.project;
        Planner::new(
            Coordinates::new(project.group.as_str(), project.artifact_id.as_str()),
            self.settings.snapshot_mode,
        )
        .with_description(project.description.clone())
        .with_dependencies(self.settings.dependencies.clone())
    }

    /// Load artifacts, command line paths taking precedence over `[artifacts]`
    pub async fn artifacts(&self, overrides: ArtifactPaths) -> Result<ArtifactSet> {
        let paths = self.settings.artifacts.clone().overridden_by(overrides);
        let set = ArtifactSet::load(&paths).await?;
        log::debug!("Loaded {:?}", set);
        Ok(set)
    }
}
