//! Publication planning.
//!
//! Planning is pure: the counter has already been consumed by the time a plan is built,
//! so planning the same inputs twice yields the same plan.

use super::pom::Dependency;
use crate::artifact::{ArtifactKind, ArtifactSet};
use crate::error::Result;
use crate::version::{ResolvedVersion, VersionSpec, snapshot_version};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the CI snapshot publication is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotMode {
    /// Descriptor-only publication depending on the main publication
    #[default]
    Reference,
    /// Full copy of the main publication's artifacts
    Duplicate,
}

impl fmt::Display for SnapshotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotMode::Reference => write!(f, "reference"),
            SnapshotMode::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Maven group and artifact id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinates {
    /// Group id, e.g. `me.zeroeightsix`
    pub group: String,
    /// Artifact id, e.g. `fiber`
    pub artifact_id: String,
}

impl Coordinates {
    /// Create coordinates
    pub fn new(group: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact_id: artifact_id.into(),
        }
    }

    /// Group id with dots replaced by path separators
    pub fn group_path(&self) -> String {
        self.group.replace('.', "/")
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact_id)
    }
}

/// Name of a publication within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationName {
    /// Versioned publication at the resolved version
    Main,
    /// `-SNAPSHOT` publication, CI only
    Snapshot,
}

impl fmt::Display for PublicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicationName::Main => write!(f, "main"),
            PublicationName::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// What a publication uploads besides its descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationContent {
    /// Primary, sources and javadoc archives
    Artifacts(ArtifactSet),
    /// No archives; the descriptor depends on the main publication at `version`
    MainReference {
        /// Version of the main publication
        version: String,
    },
}

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// Publication name
    pub name: PublicationName,
    /// Version it is published under
    pub version: String,
    /// Archives or main reference
    pub content: PublicationContent,
}

impl Publication {
    /// Whether this publication declares a dependency on the main publication
    pub fn depends_on_main(&self) -> bool {
        matches!(self.content, PublicationContent::MainReference { .. })
    }

    /// Archives carried by this publication, if any
    pub fn artifacts(&self) -> Option<&ArtifactSet> {
        match &self.content {
            PublicationContent::Artifacts(set) => Some(set),
            PublicationContent::MainReference { .. } => None,
        }
    }
}

/// Ordered publications for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationPlan {
    /// Coordinates shared by every entry
    pub coordinates: Coordinates,
    /// Description written to descriptors
    pub description: Option<String>,
    /// Dependencies declared by publications that carry archives
    pub dependencies: Vec<Dependency>,
    /// Entries in upload order; `main` is always first
    pub entries: Vec<Publication>,
}

impl PublicationPlan {
    /// Entry by name
    pub fn entry(&self, name: PublicationName) -> Option<&Publication> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Serializable overview without archive contents
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            coordinates: self.coordinates.to_string(),
            entries: self
                .entries
                .iter()
                .map(|entry| EntrySummary {
                    name: entry.name,
                    version: entry.version.clone(),
                    depends_on_main: entry.depends_on_main(),
                    artifacts: entry
                        .artifacts()
                        .map(|set| {
                            set.iter()
                                .map(|(kind, bytes)| ArtifactSummary {
                                    kind,
                                    size_bytes: bytes.len(),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Serializable plan overview
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    /// `group:artifact_id`
    pub coordinates: String,
    /// Entries in upload order
    pub entries: Vec<EntrySummary>,
}

/// Serializable entry overview
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    /// Publication name
    pub name: PublicationName,
    /// Version
    pub version: String,
    /// Whether it references the main publication
    pub depends_on_main: bool,
    /// Archives and their sizes
    pub artifacts: Vec<ArtifactSummary>,
}

/// Serializable archive overview
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    /// Archive kind
    #[serde(serialize_with = "serialize_kind")]
    pub kind: ArtifactKind,
    /// Size in bytes
    pub size_bytes: usize,
}

fn serialize_kind<S: serde::Serializer>(
    kind: &ArtifactKind,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.name())
}

/// Builds publication plans for one project
#[derive(Debug, Clone)]
pub struct Planner {
    coordinates: Coordinates,
    snapshot_mode: SnapshotMode,
    description: Option<String>,
    dependencies: Vec<Dependency>,
}

impl Planner {
    /// Create a planner
    pub fn new(coordinates: Coordinates, snapshot_mode: SnapshotMode) -> Self {
        Self {
            coordinates,
            snapshot_mode,
            description: None,
            dependencies: Vec::new(),
        }
    }

    /// Set the descriptor description
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the declared dependencies
    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Snapshot policy in use
    pub fn snapshot_mode(&self) -> SnapshotMode {
        self.snapshot_mode
    }

    /// Plan the publications for a resolved version
    ///
    /// `main` is always planned at `resolved`. Under CI a `snapshot` entry follows at
    /// `major.minor.patch-SNAPSHOT`, shaped by the snapshot mode.
    pub fn plan(
        &self,
        resolved: &ResolvedVersion,
        spec: &VersionSpec,
        is_ci: bool,
        artifacts: &ArtifactSet,
    ) -> Result<PublicationPlan> {
        let mut entries = vec![Publication {
            name: PublicationName::Main,
            version: resolved.display.clone(),
            content: PublicationContent::Artifacts(artifacts.clone()),
        }];

        if is_ci {
            let content = match self.snapshot_mode {
                SnapshotMode::Reference => PublicationContent::MainReference {
                    version: resolved.display.clone(),
                },
                SnapshotMode::Duplicate => PublicationContent::Artifacts(artifacts.clone()),
            };
            entries.push(Publication {
                name: PublicationName::Snapshot,
                version: snapshot_version(spec)?,
                content,
            });
        }

        Ok(PublicationPlan {
            coordinates: self.coordinates.clone(),
            description: self.description.clone(),
            dependencies: self.dependencies.clone(),
            entries,
        })
    }
}
