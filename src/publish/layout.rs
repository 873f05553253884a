//! Maven repository layout and checksum sidecars.

use super::plan::{Coordinates, Publication};
use crate::artifact::ArtifactKind;
use bytes::Bytes;

/// File name of the per-artifact version index
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// Checksum sidecar uploaded next to every file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// `.md5`
    Md5,
    /// `.sha1`
    Sha1,
    /// `.sha256`
    Sha256,
}

impl ChecksumAlgorithm {
    /// Every sidecar, in upload order
    pub const ALL: [ChecksumAlgorithm; 3] = [
        ChecksumAlgorithm::Md5,
        ChecksumAlgorithm::Sha1,
        ChecksumAlgorithm::Sha256,
    ];

    /// Sidecar extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }

    /// Lowercase hex digest of `data`
    pub fn digest(&self, data: &[u8]) -> String {
        use sha1::Digest as _;

        match self {
            ChecksumAlgorithm::Md5 => {
                let mut context = md5::Context::new();
                context.consume(data);
                hex::encode(context.finalize().0)
            }
            ChecksumAlgorithm::Sha1 => {
                let mut hasher = sha1::Sha1::new();
                hasher.update(data);
                hex::encode(hasher.finalize())
            }
            ChecksumAlgorithm::Sha256 => {
                let mut hasher = sha2::Sha256::new();
                hasher.update(data);
                hex::encode(hasher.finalize())
            }
        }
    }
}

/// One file to PUT, path relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFile {
    /// Relative path, `/` separated
    pub path: String,
    /// Body
    pub body: Bytes,
}

impl RepositoryFile {
    /// Create a file entry
    pub fn new(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            body: body.into(),
        }
    }

    /// Checksum sidecars for this file
    pub fn checksums(&self) -> Vec<RepositoryFile> {
        ChecksumAlgorithm::ALL
            .iter()
            .map(|algorithm| {
                RepositoryFile::new(
                    format!("{}.{}", self.path, algorithm.extension()),
                    algorithm.digest(&self.body),
                )
            })
            .collect()
    }

    /// This file followed by its checksum sidecars
    pub fn with_checksums(self) -> Vec<RepositoryFile> {
        let sidecars = self.checksums();
        let mut files = vec![self];
        files.extend(sidecars);
        files
    }
}

/// `{group/path}/{artifact_id}`
pub fn artifact_root(coordinates: &Coordinates) -> String {
    format!("{}/{}", coordinates.group_path(), coordinates.artifact_id)
}

/// `{group/path}/{artifact_id}/{version}`
pub fn version_dir(coordinates: &Coordinates, version: &str) -> String {
    format!("{}/{}", artifact_root(coordinates), version)
}

/// `{artifact_id}-{version}[-{classifier}].{extension}`
pub fn file_name(
    coordinates: &Coordinates,
    version: &str,
    classifier: Option<&str>,
    extension: &str,
) -> String {
    match classifier {
        Some(classifier) => format!(
            "{}-{}-{}.{}",
            coordinates.artifact_id, version, classifier, extension
        ),
        None => format!("{}-{}.{}", coordinates.artifact_id, version, extension),
    }
}

/// Repository path of one archive
pub fn artifact_path(coordinates: &Coordinates, version: &str, kind: ArtifactKind) -> String {
    format!(
        "{}/{}",
        version_dir(coordinates, version),
        file_name(coordinates, version, kind.classifier(), kind.extension())
    )
}

/// Repository path of the POM
pub fn pom_path(coordinates: &Coordinates, version: &str) -> String {
    format!(
        "{}/{}",
        version_dir(coordinates, version),
        file_name(coordinates, version, None, "pom")
    )
}

/// Repository path of `maven-metadata.xml`
pub fn metadata_path(coordinates: &Coordinates) -> String {
    format!("{}/{}", artifact_root(coordinates), METADATA_FILE)
}

/// Every file of a publication with sidecars: archives first, then the POM
pub fn publication_files(
    coordinates: &Coordinates,
    publication: &Publication,
    pom: String,
) -> Vec<RepositoryFile> {
    let mut files = Vec::new();
    if let Some(artifacts) = publication.artifacts() {
        for (kind, body) in artifacts.iter() {
            files.extend(
                RepositoryFile::new(
                    artifact_path(coordinates, &publication.version, kind),
                    body.clone(),
                )
                .with_checksums(),
            );
        }
    }
    files.extend(
        RepositoryFile::new(pom_path(coordinates, &publication.version), pom).with_checksums(),
    );
    files
}
