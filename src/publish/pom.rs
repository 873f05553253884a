//! POM and `maven-metadata.xml` rendering.

use super::plan::{Coordinates, Publication, PublicationContent, PublicationPlan};
use crate::error::{MetadataError, Result};
use handlebars::Handlebars;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

const POM_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{{group}}</groupId>
  <artifactId>{{artifact_id}}</artifactId>
  <version>{{version}}</version>
  <packaging>{{packaging}}</packaging>
{{#if description}}
  <description>{{description}}</description>
{{/if}}
{{#if dependencies}}
  <dependencies>
{{#each dependencies}}
    <dependency>
      <groupId>{{group}}</groupId>
      <artifactId>{{artifact_id}}</artifactId>
      <version>{{version}}</version>
      <scope>{{scope}}</scope>
    </dependency>
{{/each}}
  </dependencies>
{{/if}}
</project>
"#;

const METADATA_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>{{group}}</groupId>
  <artifactId>{{artifact_id}}</artifactId>
  <versioning>
    <latest>{{latest}}</latest>
{{#if release}}
    <release>{{release}}</release>
{{/if}}
    <versions>
{{#each versions}}
      <version>{{this}}</version>
{{/each}}
    </versions>
    <lastUpdated>{{last_updated}}</lastUpdated>
  </versioning>
</metadata>
"#;

/// Dependency declared in a POM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    /// Group id
    pub group: String,
    /// Artifact id
    pub artifact_id: String,
    /// Version
    pub version: String,
    /// Maven scope
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_scope() -> String {
    "compile".to_string()
}

impl Dependency {
    /// Compile-scoped dependency
    pub fn new(
        group: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            scope: default_scope(),
        }
    }
}

#[derive(Serialize)]
struct PomContext<'a> {
    group: &'a str,
    artifact_id: &'a str,
    version: &'a str,
    packaging: &'a str,
    description: Option<&'a str>,
    dependencies: Vec<Dependency>,
}

#[derive(Serialize)]
struct MetadataContext<'a> {
    group: &'a str,
    artifact_id: &'a str,
    latest: &'a str,
    release: Option<&'a str>,
    versions: &'a [String],
    last_updated: &'a str,
}

/// Versions listed in an artifact's `maven-metadata.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryMetadata {
    versions: Vec<String>,
}

impl RepositoryMetadata {
    /// Read the version list of an existing document
    ///
    /// Only `<metadata>/<versioning>/<versions>/<version>` elements count; comments and
    /// versions elsewhere are ignored. Anything that is not a well-formed `<metadata>`
    /// document is an error, so a bad response is never mistaken for an empty history.
    pub fn parse(xml: &str) -> std::result::Result<Self, MetadataError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut path: Vec<Vec<u8>> = Vec::new();
        let mut seen_root = false;
        let mut text = String::new();
        let mut metadata = Self::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    if path.is_empty() {
                        check_root(&name, &mut seen_root)?;
                    }
                    path.push(name);
                    text.clear();
                }
                Event::Empty(e) => {
                    if path.is_empty() {
                        check_root(e.local_name().as_ref(), &mut seen_root)?;
                    }
                }
                Event::Text(e) if in_version(&path) => text.push_str(utf8(&e)?),
                Event::CData(e) if in_version(&path) => text.push_str(utf8(&e)?),
                Event::GeneralRef(e) if in_version(&path) => {
                    text.push_str(&resolve_entity(utf8(&e)?)?);
                }
                Event::End(_) => {
                    if in_version(&path) {
                        let version = text.trim();
                        if !version.is_empty() && !metadata.versions.iter().any(|v| v == version) {
                            metadata.versions.push(version.to_string());
                        }
                    }
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = path.last() {
            return Err(MetadataError::Unterminated {
                element: String::from_utf8_lossy(open).into_owned(),
            });
        }
        if !seen_root {
            return Err(MetadataError::MissingRoot);
        }
        Ok(metadata)
    }

    /// Record a freshly published version as the newest one
    pub fn record(&mut self, version: &str) {
        self.versions.retain(|v| v != version);
        self.versions.push(version.to_string());
    }

    /// Known versions, oldest first
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Most recently published version
    pub fn latest(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }

    /// Most recently published non-snapshot version
    pub fn release(&self) -> Option<&str> {
        self.versions
            .iter()
            .rev()
            .find(|v| !v.ends_with("-SNAPSHOT"))
            .map(String::as_str)
    }
}

/// Element path of each listed version
const VERSION_PATH: [&[u8]; 4] = [b"metadata", b"versioning", b"versions", b"version"];

fn in_version(path: &[Vec<u8>]) -> bool {
    path.len() == VERSION_PATH.len()
        && path.iter().zip(VERSION_PATH).all(|(a, b)| a.as_slice() == b)
}

fn check_root(name: &[u8], seen_root: &mut bool) -> std::result::Result<(), MetadataError> {
    if name != VERSION_PATH[0] {
        return Err(MetadataError::UnexpectedRoot {
            found: String::from_utf8_lossy(name).into_owned(),
        });
    }
    *seen_root = true;
    Ok(())
}

fn utf8(bytes: &[u8]) -> std::result::Result<&str, MetadataError> {
    std::str::from_utf8(bytes).map_err(|e| MetadataError::InvalidText {
        reason: e.to_string(),
    })
}

/// Expand `&name;` or a character reference inside version text
fn resolve_entity(name: &str) -> std::result::Result<String, MetadataError> {
    if let Some(value) = quick_xml::escape::resolve_predefined_entity(name) {
        return Ok(value.to_string());
    }
    let code = match name.strip_prefix("#x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => name.strip_prefix('#').and_then(|dec| dec.parse().ok()),
    };
    code.and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| MetadataError::InvalidText {
            reason: format!("unknown entity &{};", name),
        })
}

/// Renders Maven descriptors from handlebars templates
pub struct DescriptorRenderer {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for DescriptorRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorRenderer").finish_non_exhaustive()
    }
}

impl DescriptorRenderer {
    /// Register the descriptor templates
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_template_string("pom", POM_TEMPLATE)?;
        registry.register_template_string("metadata", METADATA_TEMPLATE)?;
        Ok(Self { registry })
    }

    /// Render the POM for one publication of `plan`
    ///
    /// Publications carrying archives are `jar` packaged and declare the project's
    /// dependencies. A main reference is `pom` packaged with a single dependency on
    /// the main publication.
    pub fn pom(&self, plan: &PublicationPlan, publication: &Publication) -> Result<String> {
        let coordinates = &plan.coordinates;
        let (packaging, dependencies) = match &publication.content {
            PublicationContent::Artifacts(_) => ("jar", plan.dependencies.clone()),
            PublicationContent::MainReference { version } => (
                "pom",
                vec![Dependency::new(
                    coordinates.group.as_str(),
                    coordinates.artifact_id.as_str(),
                    version.as_str(),
                )],
            ),
        };

        let context = PomContext {
            group: &coordinates.group,
            artifact_id: &coordinates.artifact_id,
            version: &publication.version,
            packaging,
            description: plan.description.as_deref(),
            dependencies,
        };
        Ok(self.registry.render("pom", &context)?)
    }

    /// Render `maven-metadata.xml`
    pub fn metadata(
        &self,
        coordinates: &Coordinates,
        metadata: &RepositoryMetadata,
        last_updated: chrono::DateTime<chrono::Utc>,
    ) -> Result<String> {
        let last_updated = last_updated.format("%Y%m%d%H%M%S").to_string();
        let context = MetadataContext {
            group: &coordinates.group,
            artifact_id: &coordinates.artifact_id,
            latest: metadata.latest().unwrap_or_default(),
            release: metadata.release(),
            versions: metadata.versions(),
            last_updated: &last_updated,
        };
        Ok(self.registry.render("metadata", &context)?)
    }
}
