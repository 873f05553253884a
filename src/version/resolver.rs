//! Version resolution against the build counter.

use super::spec::VersionSpec;
use crate::counter::BuildCounterStore;
use crate::error::{ConfigError, Result};
use semver::{BuildMetadata, Prerelease, Version};
use serde::Serialize;

/// Pre-release tag used for local builds
pub const DEV_TAG: &str = "dev";

/// Pre-release tag of the snapshot publication
pub const SNAPSHOT_TAG: &str = "SNAPSHOT";

/// Where the build component of a resolved version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "number")]
pub enum BuildNumber {
    /// Local build, counter untouched
    Dev,
    /// Issued by the counter store during this run
    Issued(u64),
    /// What the counter would issue next; nothing was persisted
    Projected(u64),
}

/// Final version string for this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    /// Rendered version, e.g. `1.2.3-7` or `1.2.3-dev`
    pub display: String,
    /// Origin of the build component
    pub build: BuildNumber,
}

impl ResolvedVersion {
    /// Whether the build number was actually consumed from the counter
    pub fn consumed_counter(&self) -> bool {
        matches!(self.build, BuildNumber::Issued(_))
    }
}

impl std::fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

/// Resolve the version for this run
///
/// Under CI the counter for the version's key is incremented exactly once. Outside CI the
/// store is not touched at all, so local builds never pollute the shared key space.
pub async fn resolve<S>(spec: &VersionSpec, is_ci: bool, store: &S) -> Result<ResolvedVersion>
where
    S: BuildCounterStore,
{
    if !is_ci {
        return dev_version(spec);
    }

    let key = spec.counter_key();
    let number = store.next(&key).await?;
    log::info!("Issued build number {} for {}", number, key);

    Ok(ResolvedVersion {
        display: tagged(spec, &number.to_string())?.to_string(),
        build: BuildNumber::Issued(number),
    })
}

/// Compute what [`resolve`] would return without consuming a build number
pub async fn preview<S>(spec: &VersionSpec, is_ci: bool, store: &S) -> Result<ResolvedVersion>
where
    S: BuildCounterStore,
{
    if !is_ci {
        return dev_version(spec);
    }

    let key = spec.counter_key();
    let number = store.current(&key).await?.unwrap_or(0) + 1;
    log::debug!("Projected build number {} for {}", number, key);

    Ok(ResolvedVersion {
        display: tagged(spec, &number.to_string())?.to_string(),
        build: BuildNumber::Projected(number),
    })
}

/// `"{major}.{minor}.{patch}-SNAPSHOT"`
pub fn snapshot_version(spec: &VersionSpec) -> Result<String> {
    Ok(tagged(spec, SNAPSHOT_TAG)?.to_string())
}

fn dev_version(spec: &VersionSpec) -> Result<ResolvedVersion> {
    Ok(ResolvedVersion {
        display: tagged(spec, DEV_TAG)?.to_string(),
        build: BuildNumber::Dev,
    })
}

fn tagged(spec: &VersionSpec, tag: &str) -> Result<Version> {
    let pre = Prerelease::new(tag).map_err(|source| ConfigError::InvalidVersion {
        version: format!("{}-{}", spec.base(), tag),
        source,
    })?;
    Ok(Version {
        major: spec.major,
        minor: spec.minor,
        patch: spec.patch,
        pre,
        build: BuildMetadata::EMPTY,
    })
}
