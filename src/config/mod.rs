//! Run configuration.
//!
//! Static settings come from `release.toml`; branch, CI identity and the repository
//! password come from the environment. Both are read once, before any storage or
//! network access.

mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    CiSettings, CounterSettings, DEFAULT_CONFIG_FILE, ProjectSettings, ReleaseSettings,
    RepositorySettings, VersionSettings,
};
