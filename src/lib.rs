//! # maven_release
//!
//! Build versioning and publication coordinator for Maven artifacts.
//!
//! A run resolves a version from `release.toml` and the CI environment, plans one or two
//! publications and uploads them to a Maven repository:
//!
//! - **Local builds** resolve to `MAJOR.MINOR.PATCH-dev` and never touch the counter.
//! - **CI builds** take the next build number for `MAJOR.MINOR.PATCH[-branch]` from a
//!   persistent, lock-protected counter file and publish `MAJOR.MINOR.PATCH-N`, followed by a
//!   `MAJOR.MINOR.PATCH-SNAPSHOT` publication.
//! - **Uploads** are independent per publication: a failed entry is reported but does not
//!   roll back or stop the others.
//!
//! ## Usage
//!
//! ```bash
//! maven_release version            # print the resolved version
//! maven_release plan --json        # show the plan without consuming a build number
//! maven_release publish --jar build/libs/fiber.jar \
//!     --sources build/libs/fiber-sources.jar --javadoc build/libs/fiber-javadoc.jar
//! maven_release counter            # list persisted build numbers
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod artifact;
pub mod cli;
pub mod config;
pub mod counter;
pub mod error;
pub mod publish;
pub mod version;

pub use artifact::{ArtifactKind, ArtifactPaths, ArtifactSet};
pub use cli::Args;
pub use config::{Environment, ReleaseSettings};
pub use counter::{BuildCounterStore, FileCounterStore, MemoryCounterStore};
pub use error::{ReleaseError, Result};
pub use publish::{
    Credentials, MavenRepositorySink, Planner, PublicationPlan, PublishReport, SnapshotMode,
    UploadSink, publish,
};
pub use version::{ResolvedVersion, VersionSpec, preview, resolve};
