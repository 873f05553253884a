//! `release.toml` parsing and validation.

use crate::artifact::ArtifactPaths;
use crate::error::{ConfigError, Result};
use crate::publish::{Dependency, SnapshotMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "release.toml";

/// Validated release configuration
#[derive(Debug, Clone)]
pub struct ReleaseSettings {
    /// Maven coordinates and description
    pub project: ProjectSettings,
    /// Version components and trunk branch
    pub version: VersionSettings,
    /// Remote repository
    pub repository: RepositorySettings,
    /// How the snapshot publication is built
    pub snapshot_mode: SnapshotMode,
    /// Build counter persistence
    pub counter: CounterSettings,
    /// CI environment variable names
    pub ci: CiSettings,
    /// Artifact file locations (may be overridden on the command line)
    pub artifacts: ArtifactPaths,
    /// Dependencies declared in the main POM
    pub dependencies: Vec<Dependency>,
}

/// Maven coordinates of the published library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    /// Maven group id
    pub group: String,
    /// Maven artifact id
    pub artifact_id: String,
    /// Optional description written to the POM
    pub description: Option<String>,
}

/// Version inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSettings {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
    /// Branch treated as "no suffix" in counter keys
    pub trunk_branch: String,
}

/// Remote repository settings
#[derive(Debug, Clone)]
pub struct RepositorySettings {
    /// Base URL, always ending in `/`
    pub url: Url,
    /// Username sent when a password is available
    pub username: String,
    /// Environment variable holding the password
    pub password_env: String,
    /// Per-publication upload timeout
    pub timeout: Duration,
}

/// Counter store settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSettings {
    /// Counter file, resolved against the config file's directory
    pub path: PathBuf,
    /// How long `next` waits for the lock
    pub lock_timeout: Duration,
}

/// Names of the CI environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiSettings {
    /// Variable whose presence marks a CI build
    pub build_var: String,
    /// Variable holding the current branch
    pub branch_var: String,
}

impl Default for CiSettings {
    fn default() -> Self {
        Self {
            build_var: "BUILD_NUMBER".to_string(),
            branch_var: "GIT_BRANCH".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    project: RawProject,
    #[serde(default)]
    version: RawVersion,
    #[serde(default)]
    repository: RawRepository,
    #[serde(default)]
    publication: RawPublication,
    #[serde(default)]
    counter: RawCounter,
    #[serde(default)]
    ci: RawCi,
    #[serde(default)]
    artifacts: ArtifactPaths,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProject {
    group: Option<String>,
    artifact_id: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVersion {
    major: Option<NumberField>,
    minor: Option<NumberField>,
    patch: Option<NumberField>,
    trunk_branch: Option<String>,
}

/// Version components may be written as integers or as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberField {
    Int(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawRepository {
    url: Option<String>,
    username: Option<String>,
    password_env: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPublication {
    #[serde(default)]
    snapshot_mode: SnapshotMode,
}

#[derive(Debug, Default, Deserialize)]
struct RawCounter {
    path: Option<PathBuf>,
    lock_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCi {
    build_var: Option<String>,
    branch_var: Option<String>,
}

impl ReleaseSettings {
    /// Load and validate settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::parse(&content, path, base_dir)
    }

    /// Parse settings from TOML text
    ///
    /// `origin` is only used in error messages; relative paths are resolved against `base_dir`.
    pub fn parse(content: &str, origin: &Path, base_dir: &Path) -> Result<Self> {
        let raw: RawSettings = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Version components are checked first: nothing else matters without them.
        let version = VersionSettings {
            major: parse_component("version.major", raw.version.major)?,
            minor: parse_component("version.minor", raw.version.minor)?,
            patch: parse_component("version.patch", raw.version.patch)?,
            trunk_branch: non_empty(raw.version.trunk_branch)
                .unwrap_or_else(|| "master".to_string()),
        };

        let project = ProjectSettings {
            group: required("project.group", raw.project.group)?,
            artifact_id: required("project.artifact_id", raw.project.artifact_id)?,
            description: non_empty(raw.project.description),
        };

        let url = required("repository.url", raw.repository.url)?;
        let repository = RepositorySettings {
            url: parse_repository_url(&url)?,
            username: non_empty(raw.repository.username)
                .unwrap_or_else(|| "buildslave".to_string()),
            password_env: non_empty(raw.repository.password_env)
                .unwrap_or_else(|| "MAVEN_PASS".to_string()),
            timeout: Duration::from_secs(raw.repository.timeout_secs.unwrap_or(300)),
        };

        let counter_path = raw
            .counter
            .path
            .unwrap_or_else(|| PathBuf::from(".build_numbers.json"));
        let counter = CounterSettings {
            path: if counter_path.is_absolute() {
                counter_path
            } else {
                base_dir.join(counter_path)
            },
            lock_timeout: Duration::from_millis(raw.counter.lock_timeout_ms.unwrap_or(10_000)),
        };

        let defaults = CiSettings::default();
        let ci = CiSettings {
            build_var: non_empty(raw.ci.build_var).unwrap_or(defaults.build_var),
            branch_var: non_empty(raw.ci.branch_var).unwrap_or(defaults.branch_var),
        };

        Ok(Self {
            project,
            version,
            repository,
            snapshot_mode: raw.publication.snapshot_mode,
            counter,
            ci,
            artifacts: raw.artifacts.resolved_against(base_dir),
            dependencies: raw.dependencies,
        })
    }
}

fn parse_component(field: &str, value: Option<NumberField>) -> Result<u64> {
    let invalid = |value: String| ConfigError::InvalidNumber {
        field: field.to_string(),
        value,
    };
    match value {
        None => Err(ConfigError::MissingField {
            field: field.to_string(),
        }
        .into()),
        Some(NumberField::Int(n)) => u64::try_from(n).map_err(|_| invalid(n.to_string()).into()),
        Some(NumberField::Text(s)) => s.trim().parse::<u64>().map_err(|_| invalid(s).into()),
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    non_empty(value).ok_or_else(|| {
        ConfigError::MissingField {
            field: field.to_string(),
        }
        .into()
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_repository_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| ConfigError::InvalidRepositoryUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())).into());
    }
    // Url::join drops the last segment unless the base ends with a slash
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
