//! Publication planning and upload.
//!
//! A [`PublicationPlan`] is built by a [`Planner`] and pushed entry by entry through an
//! [`UploadSink`]. Entries are committed independently: a failed entry never rolls back
//! the ones before it and never stops the ones after it.

mod layout;
mod plan;
mod pom;
mod sink;

pub use layout::{ChecksumAlgorithm, METADATA_FILE, RepositoryFile};
pub use plan::{
    ArtifactSummary, Coordinates, EntrySummary, PlanSummary, Planner, Publication,
    PublicationContent, PublicationName, PublicationPlan, SnapshotMode,
};
pub use pom::{Dependency, DescriptorRenderer, RepositoryMetadata};
pub use sink::{Credentials, MavenRepositorySink, UploadSink};

/// Repository path helpers
pub mod paths {
    pub use super::layout::{
        artifact_path, artifact_root, file_name, metadata_path, pom_path, publication_files,
        version_dir,
    };
}

use crate::error::{ReleaseError, Result, UploadCause, UploadError};
use serde::Serialize;
use std::time::Duration;

/// Result of uploading one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    /// Publication name
    pub name: PublicationName,
    /// Version uploaded
    pub version: String,
    /// Success, or the entry's failure
    pub result: std::result::Result<(), UploadError>,
}

impl EntryOutcome {
    /// Whether the entry was uploaded
    pub fn is_uploaded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-entry outcomes of one publish run, in plan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Outcomes in upload order
    pub outcomes: Vec<EntryOutcome>,
}

impl PublishReport {
    /// Whether every entry was uploaded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(EntryOutcome::is_uploaded)
    }

    /// Entries that were uploaded
    pub fn uploaded(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| o.is_uploaded())
    }

    /// Failures, in upload order
    pub fn failures(&self) -> impl Iterator<Item = &UploadError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// `Ok` when everything was uploaded
    ///
    /// A single failure is returned as is; several collapse into
    /// [`ReleaseError::PartialPublish`].
    pub fn ensure_success(&self) -> Result<()> {
        let failures: Vec<&UploadError> = self.failures().collect();
        match failures.as_slice() {
            [] => Ok(()),
            [only] if self.outcomes.len() == 1 => Err(ReleaseError::Upload((*only).clone())),
            _ => Err(ReleaseError::PartialPublish {
                failed: failures.len(),
                total: self.outcomes.len(),
            }),
        }
    }

    /// Serializable overview
    pub fn summary(&self) -> Vec<OutcomeSummary> {
        self.outcomes
            .iter()
            .map(|o| OutcomeSummary {
                name: o.name,
                version: o.version.clone(),
                uploaded: o.is_uploaded(),
                error: o.result.as_ref().err().map(|e| e.cause.to_string()),
            })
            .collect()
    }
}

/// Serializable outcome of one entry
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    /// Publication name
    pub name: PublicationName,
    /// Version
    pub version: String,
    /// Whether it was uploaded
    pub uploaded: bool,
    /// Failure cause, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Upload every entry of `plan` in order
///
/// Each entry gets at most `timeout`; an entry that runs over is reported as
/// [`UploadCause::Timeout`]. Without credentials the sink uploads anonymously.
pub async fn publish<S>(
    plan: &PublicationPlan,
    sink: &S,
    credentials: Option<&Credentials>,
    timeout: Duration,
) -> PublishReport
where
    S: UploadSink,
{
    if credentials.is_none() {
        log::info!("No repository credentials available, uploading anonymously");
    }

    let mut report = PublishReport::default();
    for publication in &plan.entries {
        let result =
            match tokio::time::timeout(timeout, sink.upload(plan, publication, credentials)).await
            {
                Ok(result) => result,
                Err(_elapsed) => Err(UploadCause::Timeout { after: timeout }),
            };

        let result = result.map_err(|cause| UploadError {
            entry: publication.name.to_string(),
            version: publication.version.clone(),
            cause,
        });

        match &result {
            Ok(()) => log::info!("Published {} {}", publication.name, publication.version),
            Err(e) => log::warn!("{}", e),
        }

        report.outcomes.push(EntryOutcome {
            name: publication.name,
            version: publication.version.clone(),
            result,
        });
    }
    report
}
