//! Version inputs and counter keys.

use crate::config::{Environment, VersionSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch a build runs on, relative to the trunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BranchRef {
    /// The trunk branch; contributes no suffix
    Trunk,
    /// Any other branch; contributes `-{name}`
    Named(String),
    /// Branch information unavailable; contributes no suffix
    Unknown,
}

impl BranchRef {
    /// Classify an optional branch name against the trunk name
    pub fn classify(branch: Option<&str>, trunk: &str) -> Self {
        match branch.map(str::trim).filter(|b| !b.is_empty()) {
            None => BranchRef::Unknown,
            Some(b) if b == trunk => BranchRef::Trunk,
            Some(b) => BranchRef::Named(b.to_string()),
        }
    }

    /// Counter-key suffix for this branch
    pub fn suffix(&self) -> String {
        match self {
            BranchRef::Named(name) => format!("-{}", name),
            BranchRef::Trunk | BranchRef::Unknown => String::new(),
        }
    }
}

/// Major/minor/patch plus branch, read once per run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionSpec {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
    /// Branch classification
    pub branch: BranchRef,
}

impl VersionSpec {
    /// Create a spec, classifying `branch` against `trunk`
    pub fn new(major: u64, minor: u64, patch: u64, branch: Option<&str>, trunk: &str) -> Self {
        Self {
            major,
            minor,
            patch,
            branch: BranchRef::classify(branch, trunk),
        }
    }

    /// Combine static settings with the captured environment
    pub fn from_inputs(settings: &VersionSettings, env: &Environment) -> Self {
        Self::new(
            settings.major,
            settings.minor,
            settings.patch,
            env.branch.as_deref(),
            &settings.trunk_branch,
        )
    }

    /// `major.minor.patch`
    pub fn base(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Persistence key for the build counter
    pub fn counter_key(&self) -> CounterKey {
        CounterKey(format!("{}{}", self.base(), self.branch.suffix()))
    }
}

/// `"{major}.{minor}.{patch}[-{branch}]"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterKey(String);

impl CounterKey {
    /// Wrap an already-formatted key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
