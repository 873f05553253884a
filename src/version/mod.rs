//! Version resolution.
//!
//! A run's version is `major.minor.patch` plus a build component: the next value of
//! the persisted build counter under CI, `dev` otherwise.

mod resolver;
mod spec;

pub use resolver::{
    BuildNumber, DEV_TAG, ResolvedVersion, SNAPSHOT_TAG, preview, resolve, snapshot_version,
};
pub use spec::{BranchRef, CounterKey, VersionSpec};
