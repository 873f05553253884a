#[cfg(test)]
mod tests {
    use maven_release::artifact::ArtifactSet;
    use maven_release::error::UploadCause;
    use maven_release::publish::{
        self, Coordinates, Credentials, MavenRepositorySink, Planner, PublicationPlan,
        RepositoryMetadata, SnapshotMode,
    };
    use maven_release::version::{BuildNumber, ResolvedVersion, VersionSpec};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use url::Url;

    #[derive(Debug, Clone)]
    struct Request {
        method: String,
        path: String,
        authorization: Option<String>,
    }

    /// In-memory Maven repository speaking just enough HTTP/1.1 for PUT and GET
    #[derive(Default)]
    struct Repository {
        files: Mutex<HashMap<String, Vec<u8>>>,
        requests: Mutex<Vec<Request>>,
        require_auth: bool,
    }

    impl Repository {
        fn puts(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.method == "PUT")
                .map(|r| r.path.clone())
                .collect()
        }

        fn file(&self, path: &str) -> Option<String> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .map(|body| String::from_utf8_lossy(body).into_owned())
        }
    }

    async fn start(repository: Arc<Repository>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let repository = Arc::clone(&repository);
                tokio::spawn(async move { handle(stream, repository).await });
            }
        });
        Url::parse(&format!("http://{}/releases/", addr)).unwrap()
    }

    async fn handle(mut stream: TcpStream, repository: Arc<Repository>) {
        let mut data = Vec::new();
        let mut chunk = [0u8; 8192];
        let header_end = loop {
            if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => data.extend_from_slice(&chunk[..n]),
            }
        };

        let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().unwrap_or_default().split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let path = request_line.next().unwrap_or_default().to_string();

        let mut content_length = 0usize;
        let mut authorization = None;
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                match name.trim().to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.trim().parse().unwrap_or(0),
                    "authorization" => authorization = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        let mut body = data[header_end..].to_vec();
        while body.len() < content_length {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => body.extend_from_slice(&chunk[..n]),
            }
        }

        repository.requests.lock().unwrap().push(Request {
            method: method.clone(),
            path: path.clone(),
            authorization: authorization.clone(),
        });

        let (status, response_body) = if repository.require_auth && authorization.is_none() {
            ("401 Unauthorized", Vec::new())
        } else if method == "PUT" {
            repository.files.lock().unwrap().insert(path, body);
            ("201 Created", Vec::new())
        } else {
            match repository.files.lock().unwrap().get(&path) {
                Some(stored) => ("200 OK", stored.clone()),
                None => ("404 Not Found", Vec::new()),
            }
        };

        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            response_body.len()
        )
        .into_bytes();
        response.extend_from_slice(&response_body);
        let _ = stream.write_all(&response).await;
        let _ = stream.shutdown().await;
    }

    fn ci_plan(mode: SnapshotMode) -> PublicationPlan {
        let spec = VersionSpec::new(1, 2, 3, Some("feature-x"), "master");
        let resolved = ResolvedVersion {
            display: "1.2.3-1".to_string(),
            build: BuildNumber::Issued(1),
        };
        Planner::new(Coordinates::new("me.zeroeightsix", "fiber"), mode)
            .plan(
                &resolved,
                &spec,
                true,
                &ArtifactSet::new(&b"shadow"[..], &b"sources"[..], &b"javadoc"[..]),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn reference_plan_lands_in_maven_layout() {
        let repository = Arc::new(Repository::default());
        let base = start(Arc::clone(&repository)).await;
        let sink = MavenRepositorySink::new(base, Duration::from_secs(10)).unwrap();
        let credentials = Credentials::new("buildslave", "secret");

        let report = publish::publish(
            &ci_plan(SnapshotMode::Reference),
            &sink,
            Some(&credentials),
            Duration::from_secs(10),
        )
        .await;
        assert!(report.is_success(), "{:?}", report);

        let root = "/releases/me/zeroeightsix/fiber";
        let puts = repository.puts();
        for expected in [
            "1.2.3-1/fiber-1.2.3-1.jar",
            "1.2.3-1/fiber-1.2.3-1.jar.sha1",
            "1.2.3-1/fiber-1.2.3-1-sources.jar",
            "1.2.3-1/fiber-1.2.3-1-javadoc.jar.md5",
            "1.2.3-1/fiber-1.2.3-1.pom",
            "1.2.3-SNAPSHOT/fiber-1.2.3-SNAPSHOT.pom",
            "1.2.3-SNAPSHOT/fiber-1.2.3-SNAPSHOT.pom.sha256",
            "maven-metadata.xml",
        ] {
            let path = format!("{}/{}", root, expected);
            assert!(puts.contains(&path), "missing PUT {}", path);
        }
        assert!(!puts.iter().any(|p| p.ends_with("fiber-1.2.3-SNAPSHOT.jar")));

        let snapshot_pom = repository
            .file(&format!("{}/1.2.3-SNAPSHOT/fiber-1.2.3-SNAPSHOT.pom", root))
            .unwrap();
        assert!(snapshot_pom.contains("<packaging>pom</packaging>"));
        assert!(snapshot_pom.contains("<version>1.2.3-1</version>"));

        let metadata = RepositoryMetadata::parse(
            &repository
                .file(&format!("{}/maven-metadata.xml", root))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(metadata.versions(), ["1.2.3-1", "1.2.3-SNAPSHOT"]);
        assert_eq!(metadata.release(), Some("1.2.3-1"));

        let requests = repository.requests.lock().unwrap();
        assert!(requests.iter().all(|r| {
            r.authorization
                .as_deref()
                .is_some_and(|auth| auth.starts_with("Basic "))
        }));
    }

    #[tokio::test]
    async fn duplicate_plan_uploads_archives_twice() {
        let repository = Arc::new(Repository::default());
        let base = start(Arc::clone(&repository)).await;
        let sink = MavenRepositorySink::new(base, Duration::from_secs(10)).unwrap();

        let report = publish::publish(
            &ci_plan(SnapshotMode::Duplicate),
            &sink,
            None,
            Duration::from_secs(10),
        )
        .await;
        assert!(report.is_success());

        let jar = repository
            .file("/releases/me/zeroeightsix/fiber/1.2.3-SNAPSHOT/fiber-1.2.3-SNAPSHOT.jar")
            .unwrap();
        assert_eq!(jar, "shadow");

        // Anonymous upload sends no credentials
        let requests = repository.requests.lock().unwrap();
        assert!(requests.iter().all(|r| r.authorization.is_none()));
    }

    #[tokio::test]
    async fn rejected_credentials_fail_every_entry() {
        let repository = Arc::new(Repository {
            require_auth: true,
            ..Default::default()
        });
        let base = start(Arc::clone(&repository)).await;
        let sink = MavenRepositorySink::new(base, Duration::from_secs(10)).unwrap();

        let report = publish::publish(
            &ci_plan(SnapshotMode::Reference),
            &sink,
            None,
            Duration::from_secs(10),
        )
        .await;

        assert_eq!(report.failures().count(), 2);
        for failure in report.failures() {
            assert!(matches!(
                failure.cause,
                UploadCause::Authentication { status: 401, .. }
            ));
        }
        assert!(repository.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_metadata_is_never_overwritten() {
        let repository = Arc::new(Repository::default());
        let metadata_path = "/releases/me/zeroeightsix/fiber/maven-metadata.xml";
        let error_page = "<!DOCTYPE html><html><body>Maintenance</body></html>";
        repository
            .files
            .lock()
            .unwrap()
            .insert(metadata_path.to_string(), error_page.as_bytes().to_vec());
        let base = start(Arc::clone(&repository)).await;
        let sink = MavenRepositorySink::new(base, Duration::from_secs(10)).unwrap();

        let report = publish::publish(
            &ci_plan(SnapshotMode::Reference),
            &sink,
            None,
            Duration::from_secs(10),
        )
        .await;

        assert_eq!(report.failures().count(), 2);
        for failure in report.failures() {
            assert!(matches!(failure.cause, UploadCause::InvalidMetadata { .. }));
        }
        assert!(!repository.puts().iter().any(|p| p.contains("maven-metadata.xml")));
        assert_eq!(repository.file(metadata_path).as_deref(), Some(error_page));
    }
}
