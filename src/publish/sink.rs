//! Upload sinks.
//!
//! [`MavenRepositorySink`] writes publications to a Maven repository over plain HTTP
//! PUTs, the way Gradle and Maven deploy to a static repository.

use super::layout::{self, RepositoryFile};
use super::plan::{Coordinates, Publication, PublicationPlan};
use super::pom::{DescriptorRenderer, RepositoryMetadata};
use crate::error::{Result, UploadCause};
use reqwest::StatusCode;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Repository username and password
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Username
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Destination of publications
///
/// One call uploads one publication of a plan. Implementations report failures through
/// [`UploadCause`]; the caller attaches the entry name and version.
pub trait UploadSink {
    /// Upload `publication` with its descriptor
    fn upload(
        &self,
        plan: &PublicationPlan,
        publication: &Publication,
        credentials: Option<&Credentials>,
    ) -> impl Future<Output = std::result::Result<(), UploadCause>> + Send;
}

/// HTTP Maven repository
pub struct MavenRepositorySink {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
    renderer: DescriptorRenderer,
}

impl fmt::Debug for MavenRepositorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MavenRepositorySink")
            .field("base", &self.base.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MavenRepositorySink {
    /// Create a sink for the repository at `base`
    ///
    /// `timeout` bounds each individual request.
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("maven_release/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base,
            timeout,
            renderer: DescriptorRenderer::new()?,
        })
    }

    /// Repository base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, path: &str) -> std::result::Result<Url, UploadCause> {
        self.base.join(path).map_err(|e| UploadCause::Network {
            reason: format!("invalid repository path {}: {}", path, e),
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> UploadCause {
        if error.is_timeout() {
            UploadCause::Timeout {
                after: self.timeout,
            }
        } else {
            UploadCause::Network {
                reason: error.to_string(),
            }
        }
    }

    async fn put(
        &self,
        file: &RepositoryFile,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<(), UploadCause> {
        let url = self.url_for(&file.path)?;
        log::debug!("PUT {} ({} bytes)", url, file.body.len());

        let mut request = self.client.put(url.clone()).body(file.body.clone());
        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        check_status(&url, response.status())
    }

    async fn fetch_metadata(
        &self,
        coordinates: &Coordinates,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<RepositoryMetadata, UploadCause> {
        let url = self.url_for(&layout::metadata_path(coordinates))?;

        let mut request = self.client.get(url.clone());
        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("No metadata at {} yet", url);
            return Ok(RepositoryMetadata::default());
        }
        check_status(&url, response.status())?;

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        RepositoryMetadata::parse(&body).map_err(|e| UploadCause::InvalidMetadata {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn update_metadata(
        &self,
        coordinates: &Coordinates,
        version: &str,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<(), UploadCause> {
        let mut metadata = self.fetch_metadata(coordinates, credentials).await?;
        metadata.record(version);

        let path = layout::metadata_path(coordinates);
        let xml = self
            .renderer
            .metadata(coordinates, &metadata, chrono::Utc::now())
            .map_err(|e| UploadCause::Render {
                file: path.clone(),
                reason: e.to_string(),
            })?;

        for file in RepositoryFile::new(path, xml).with_checksums() {
            self.put(&file, credentials).await?;
        }
        Ok(())
    }
}

impl UploadSink for MavenRepositorySink {
    async fn upload(
        &self,
        plan: &PublicationPlan,
        publication: &Publication,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<(), UploadCause> {
        let coordinates = &plan.coordinates;
        let pom = self
            .renderer
            .pom(plan, publication)
            .map_err(|e| UploadCause::Render {
                file: layout::pom_path(coordinates, &publication.version),
                reason: e.to_string(),
            })?;

        let files = layout::publication_files(coordinates, publication, pom);
        log::info!(
            "Uploading {} {} ({} files) to {}",
            publication.name,
            publication.version,
            files.len(),
            self.base
        );
        for file in &files {
            self.put(file, credentials).await?;
        }

        self.update_metadata(coordinates, &publication.version, credentials)
            .await
    }
}

fn check_status(url: &Url, status: StatusCode) -> std::result::Result<(), UploadCause> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(UploadCause::Authentication {
            url: url.to_string(),
            status: status.as_u16(),
        }),
        _ => Err(UploadCause::Rejected {
            url: url.to_string(),
            status: status.as_u16(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let url = Url::parse("http://repo.example/me/x.jar").unwrap();
        assert!(check_status(&url, StatusCode::CREATED).is_ok());
        assert!(matches!(
            check_status(&url, StatusCode::UNAUTHORIZED),
            Err(UploadCause::Authentication { status: 401, .. })
        ));
        assert!(matches!(
            check_status(&url, StatusCode::FORBIDDEN),
            Err(UploadCause::Authentication { status: 403, .. })
        ));
        assert!(matches!(
            check_status(&url, StatusCode::CONFLICT),
            Err(UploadCause::Rejected { status: 409, .. })
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("buildslave", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("buildslave"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_paths_join_under_base() {
        let sink = MavenRepositorySink::new(
            Url::parse("http://repo.example/releases/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            sink.url_for("me/zeroeightsix/fiber/maven-metadata.xml")
                .unwrap()
                .as_str(),
            "http://repo.example/releases/me/zeroeightsix/fiber/maven-metadata.xml"
        );
    }

    #[tokio::test]
    async fn test_unreachable_repository_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let sink = MavenRepositorySink::new(
            Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        let file = RepositoryFile::new("a/b.jar", &b"x"[..]);
        let err = sink.put(&file, None).await.unwrap_err();
        assert!(matches!(err, UploadCause::Network { .. }));
    }
}
