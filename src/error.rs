//! Error types for maven_release operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for maven_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all maven_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Configuration errors (fatal, raised before any storage or network access)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Build counter storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Upload errors for a single publication
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// One or more publications of a plan failed to upload
    #[error("{failed} of {total} publication(s) failed to upload")]
    PartialPublish {
        /// Number of failed publications
        failed: usize,
        /// Number of publications in the plan
        total: usize,
    },

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// HTTP client setup errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template rendering errors
    #[error("Template error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// Template registration errors
    #[error("Template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required field missing
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Dotted field path, e.g. `version.major`
        field: String,
    },

    /// Field is not a non-negative integer
    #[error("Field '{field}' must be a non-negative integer, found '{value}'")]
    InvalidNumber {
        /// Dotted field path
        field: String,
        /// Raw value found
        value: String,
    },

    /// Version string could not be built
    #[error("Invalid version '{version}': {source}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// Repository URL is unusable
    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidRepositoryUrl {
        /// URL as configured
        url: String,
        /// Reason for the error
        reason: String,
    },

    /// Config file could not be read
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Path to config file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// Path to config file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Artifact path not configured or not readable
    #[error("Missing {kind} artifact: {reason}")]
    MissingArtifact {
        /// Artifact kind (primary, sources, javadoc)
        kind: String,
        /// Reason for the error
        reason: String,
    },
}

/// Build counter storage errors
///
/// Every variant is fatal for the run. No fallback counter value is ever synthesized.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Counter storage is unreachable
    #[error("Counter store at {path} is unavailable: {reason}")]
    Unavailable {
        /// Path to counter file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Lock could not be acquired in time
    #[error("Timed out after {waited_ms}ms waiting for counter lock {path}")]
    LockTimeout {
        /// Path to lock file
        path: PathBuf,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// Counter file exists but cannot be interpreted
    #[error("Counter store corrupted: {reason}")]
    Corrupted {
        /// Reason for the error
        reason: String,
    },

    /// Counter file could not be written
    #[error("Failed to write counter store: {reason}")]
    WriteFailed {
        /// Reason for the error
        reason: String,
    },
}

/// Failure to upload one publication of a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("publication '{entry}' ({version}): {cause}")]
pub struct UploadError {
    /// Publication name
    pub entry: String,
    /// Version being uploaded
    pub version: String,
    /// Underlying cause
    pub cause: UploadCause,
}

/// Why an upload failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadCause {
    /// Upload did not finish within the caller-supplied timeout
    #[error("timed out after {}s", .after.as_secs_f64())]
    Timeout {
        /// Timeout that elapsed
        after: Duration,
    },

    /// Repository refused the credentials (or their absence)
    #[error("authentication failed for {url} (HTTP {status})")]
    Authentication {
        /// URL of the rejected request
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Repository answered with an unexpected status
    #[error("{url} rejected with HTTP {status}")]
    Rejected {
        /// URL of the rejected request
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Transport failure
    #[error("network error: {reason}")]
    Network {
        /// Reason for the error
        reason: String,
    },

    /// Descriptor could not be rendered
    #[error("failed to render {file}: {reason}")]
    Render {
        /// File being rendered
        file: String,
        /// Reason for the error
        reason: String,
    },

    /// Existing `maven-metadata.xml` could not be read; it is left untouched
    #[error("unreadable repository metadata at {url}: {reason}")]
    InvalidMetadata {
        /// URL of the metadata document
        url: String,
        /// Reason for the error
        reason: String,
    },
}

/// Errors reading an existing `maven-metadata.xml`
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Document is not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Document has no root element
    #[error("no root element")]
    MissingRoot,

    /// Root element is not `<metadata>`
    #[error("expected <metadata> root, found <{found}>")]
    UnexpectedRoot {
        /// Local name of the root element found
        found: String,
    },

    /// Document ends inside an element
    #[error("document ends inside <{element}>")]
    Unterminated {
        /// Innermost open element
        element: String,
    },

    /// Version text is not valid UTF-8 or uses an unknown entity
    #[error("invalid version text: {reason}")]
    InvalidText {
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl From<handlebars::TemplateError> for ReleaseError {
    fn from(error: handlebars::TemplateError) -> Self {
        ReleaseError::Template(Box::new(error))
    }
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::MissingField { field })
            | ReleaseError::Config(ConfigError::InvalidNumber { field, .. }) => vec![
                format!("Set '{}' in release.toml", field),
                "Version components must be non-negative integers".to_string(),
            ],
            ReleaseError::Config(ConfigError::MissingArtifact { kind, .. }) => vec![
                format!("Pass --{} <PATH> or set it under [artifacts]", artifact_flag(kind)),
                "Build the jars before publishing".to_string(),
            ],
            ReleaseError::Storage(StorageError::LockTimeout { path, .. }) => vec![
                "Another build may be holding the counter lock; retry once it finishes".to_string(),
                format!("Check for a hung process holding {}", path.display()),
            ],
            ReleaseError::Storage(StorageError::Corrupted { .. }) => vec![
                "Inspect the counter file and restore it from backup".to_string(),
                "Do not delete it: build numbers would restart and collide".to_string(),
            ],
            ReleaseError::Storage(StorageError::Unavailable { path, .. }) => vec![
                format!("Ensure {} exists and is writable", path.display()),
            ],
            ReleaseError::Upload(UploadError {
                cause: UploadCause::Authentication { .. },
                ..
            }) => vec![
                "Set the repository password variable (default MAVEN_PASS)".to_string(),
                "Verify [repository].username in release.toml".to_string(),
            ],
            ReleaseError::Upload(UploadError {
                cause: UploadCause::InvalidMetadata { url, .. },
                ..
            }) => vec![
                format!("Inspect {}; it was not overwritten", url),
                "Restore a valid maven-metadata.xml or remove it to start over".to_string(),
            ],
            ReleaseError::PartialPublish { .. } => vec![
                "Earlier publications were committed and are not rolled back".to_string(),
                "Re-run the failed publications after fixing the cause".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

fn artifact_flag(kind: &str) -> &str {
    match kind {
        "primary" => "jar",
        other => other,
    }
}
