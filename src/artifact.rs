//! Artifact sets handed over by the build.
//!
//! The build tool produces the relocated primary jar, a sources jar and a javadoc jar.
//! This crate only loads those files; it never builds or rewrites them.

use crate::error::{ConfigError, Result};
use bytes::Bytes;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One of the three archives of a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Bundled library jar (no classifier)
    Primary,
    /// Source archive
    Sources,
    /// Documentation archive
    Javadoc,
}

impl ArtifactKind {
    /// Every kind, in upload order
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Primary,
        ArtifactKind::Sources,
        ArtifactKind::Javadoc,
    ];

    /// Maven classifier for this kind
    pub fn classifier(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Primary => None,
            ArtifactKind::Sources => Some("sources"),
            ArtifactKind::Javadoc => Some("javadoc"),
        }
    }

    /// File extension
    pub fn extension(&self) -> &'static str {
        "jar"
    }

    /// Short name used in configuration and messages
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::Primary => "primary",
            ArtifactKind::Sources => "sources",
            ArtifactKind::Javadoc => "javadoc",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primary, sources and javadoc archives, immutable once loaded
#[derive(Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    primary: Bytes,
    sources: Bytes,
    javadoc: Bytes,
}

impl fmt::Debug for ArtifactSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactSet")
            .field("primary", &format_args!("{} bytes", self.primary.len()))
            .field("sources", &format_args!("{} bytes", self.sources.len()))
            .field("javadoc", &format_args!("{} bytes", self.javadoc.len()))
            .finish()
    }
}

impl ArtifactSet {
    /// Bundle three archives
    pub fn new(
        primary: impl Into<Bytes>,
        sources: impl Into<Bytes>,
        javadoc: impl Into<Bytes>,
    ) -> Self {
        Self {
            primary: primary.into(),
            sources: sources.into(),
            javadoc: javadoc.into(),
        }
    }

    /// Contents of one archive
    pub fn get(&self, kind: ArtifactKind) -> &Bytes {
        match kind {
            ArtifactKind::Primary => &self.primary,
            ArtifactKind::Sources => &self.sources,
            ArtifactKind::Javadoc => &self.javadoc,
        }
    }

    /// Archives in upload order
    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &Bytes)> {
        ArtifactKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Total size in bytes
    pub fn total_len(&self) -> usize {
        self.iter().map(|(_, bytes)| bytes.len()).sum()
    }

    /// Read the three archives from disk
    ///
    /// Every path is checked for presence before any file is read.
    pub async fn load(paths: &ArtifactPaths) -> Result<Self> {
        let primary = paths.require(ArtifactKind::Primary)?;
        let sources = paths.require(ArtifactKind::Sources)?;
        let javadoc = paths.require(ArtifactKind::Javadoc)?;

        Ok(Self {
            primary: read(ArtifactKind::Primary, primary).await?,
            sources: read(ArtifactKind::Sources, sources).await?,
            javadoc: read(ArtifactKind::Javadoc, javadoc).await?,
        })
    }
}

/// Locations of the three archives
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactPaths {
    /// Bundled library jar
    pub primary: Option<PathBuf>,
    /// Source archive
    pub sources: Option<PathBuf>,
    /// Documentation archive
    pub javadoc: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Resolve relative paths against `base`
    pub fn resolved_against(self, base: &Path) -> Self {
        let resolve = |p: Option<PathBuf>| {
            p.map(|p| if p.is_absolute() { p } else { base.join(p) })
        };
        Self {
            primary: resolve(self.primary),
            sources: resolve(self.sources),
            javadoc: resolve(self.javadoc),
        }
    }

    /// Take each path from `overrides` when present, otherwise keep ours
    pub fn overridden_by(self, overrides: ArtifactPaths) -> Self {
        Self {
            primary: overrides.primary.or(self.primary),
            sources: overrides.sources.or(self.sources),
            javadoc: overrides.javadoc.or(self.javadoc),
        }
    }

    /// Path for one kind
    pub fn get(&self, kind: ArtifactKind) -> Option<&Path> {
        match kind {
            ArtifactKind::Primary => self.primary.as_deref(),
            ArtifactKind::Sources => self.sources.as_deref(),
            ArtifactKind::Javadoc => self.javadoc.as_deref(),
        }
    }

    fn require(&self, kind: ArtifactKind) -> Result<&Path> {
        self.get(kind).ok_or_else(|| {
            ConfigError::MissingArtifact {
                kind: kind.name().to_string(),
                reason: "no path configured".to_string(),
            }
            .into()
        })
    }
}

async fn read(kind: ArtifactKind, path: &Path) -> Result<Bytes> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ConfigError::MissingArtifact {
            kind: kind.name().to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;
    log::debug!("Loaded {} artifact {} ({} bytes)", kind, path.display(), data.len());
    Ok(Bytes::from(data))
}
