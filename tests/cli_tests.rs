#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Scratch project with a `release.toml` and built jars
    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new() -> Self {
            Self::with_version("major = 1\nminor = 2\npatch = 3\n")
        }

        fn with_version(version_table: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            // A port that was just released refuses connections
            let port = {
                let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
                listener.local_addr().unwrap().port()
            };
            let config = format!(
                r#"[project]
group = "me.zeroeightsix"
artifact_id = "fiber"

[version]
{version_table}
[repository]
url = "http://127.0.0.1:{port}/"
timeout_secs = 5

[counter]
path = "counters.json"
lock_timeout_ms = 2000

[[dependencies]]
group = "blue.endless"
artifact_id = "jankson"
version = "1.1.1"
"#
            );
            std::fs::write(dir.path().join("release.toml"), config).unwrap();

            let libs = dir.path().join("build").join("libs");
            std::fs::create_dir_all(&libs).unwrap();
            for (name, body) in [
                ("fiber.jar", "shadow"),
                ("fiber-sources.jar", "sources"),
                ("fiber-javadoc.jar", "javadoc"),
            ] {
                std::fs::write(libs.join(name), body).unwrap();
            }
            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn counter_file(&self) -> PathBuf {
            self.path().join("counters.json")
        }

        fn cmd(&self) -> Command {
            let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("maven_release");
            cmd.current_dir(self.path());
            for var in ["BUILD_NUMBER", "GIT_BRANCH", "MAVEN_PASS", "RUST_LOG"] {
                cmd.env_remove(var);
            }
            cmd
        }

        fn ci_cmd(&self, branch: &str) -> Command {
            let mut cmd = self.cmd();
            cmd.env("BUILD_NUMBER", "42").env("GIT_BRANCH", branch);
            cmd
        }

        fn artifact_args(cmd: &mut Command) -> &mut Command {
            cmd.args([
                "--jar",
                "build/libs/fiber.jar",
                "--sources",
                "build/libs/fiber-sources.jar",
                "--javadoc",
                "build/libs/fiber-javadoc.jar",
            ])
        }
    }

    #[test]
    fn test_local_version_is_dev_and_leaves_no_counter() {
        let project = Project::new();

        project
            .cmd()
            .arg("version")
            .assert()
            .success()
            .stdout("1.2.3-dev\n");

        assert!(!project.counter_file().exists());
    }

    #[test]
    fn test_ci_version_advances_per_branch() {
        let project = Project::new();

        project
            .ci_cmd("origin/feature-x")
            .arg("version")
            .assert()
            .success()
            .stdout("1.2.3-1\n");
        project
            .ci_cmd("origin/feature-x")
            .arg("version")
            .assert()
            .success()
            .stdout("1.2.3-2\n");
        project
            .ci_cmd("origin/master")
            .arg("version")
            .assert()
            .success()
            .stdout("1.2.3-1\n");

        let output = project
            .cmd()
            .args(["counter", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let counters: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(counters["1.2.3-feature-x"]["value"], 2);
        assert_eq!(counters["1.2.3"]["value"], 1);
    }

    #[test]
    fn test_dry_run_version_does_not_consume() {
        let project = Project::new();

        for _ in 0..2 {
            project
                .ci_cmd("feature-x")
                .args(["version", "--dry-run"])
                .assert()
                .success()
                .stdout("1.2.3-1\n");
        }
        assert!(!project.counter_file().exists());
    }

    #[test]
    fn test_missing_version_component_is_fatal() {
        let project = Project::with_version("major = 1\nminor = 2\n");

        project
            .ci_cmd("master")
            .arg("version")
            .assert()
            .failure()
            .stderr(predicate::str::contains("version.patch"));
        assert!(!project.counter_file().exists());
    }

    #[test]
    fn test_non_numeric_version_component_is_fatal() {
        let project = Project::with_version("major = 1\nminor = \"two\"\npatch = 3\n");

        project
            .cmd()
            .arg("version")
            .assert()
            .failure()
            .stderr(predicate::str::contains("version.minor"));
    }

    #[test]
    fn test_missing_config_file_fails() {
        let project = Project::new();

        project
            .cmd()
            .args(["--config", "nope.toml", "version"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("nope.toml"));
    }

    #[test]
    fn test_plan_json_in_ci_does_not_consume() {
        let project = Project::new();

        let mut cmd = project.ci_cmd("feature-x");
        cmd.args(["plan", "--json"]);
        let output = Project::artifact_args(&mut cmd).output().unwrap();
        assert!(output.status.success());

        let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(plan["resolved"]["display"], "1.2.3-1");
        assert_eq!(plan["snapshot_mode"], "reference");
        assert_eq!(plan["plan"]["coordinates"], "me.zeroeightsix:fiber");
        assert_eq!(plan["plan"]["entries"][0]["name"], "main");
        assert_eq!(plan["plan"]["entries"][1]["name"], "snapshot");
        assert_eq!(plan["plan"]["entries"][1]["version"], "1.2.3-SNAPSHOT");
        assert_eq!(plan["plan"]["entries"][1]["depends_on_main"], true);

        assert!(!project.counter_file().exists());
    }

    #[test]
    fn test_local_plan_has_no_snapshot() {
        let project = Project::new();

        let mut cmd = project.cmd();
        cmd.args(["plan", "--json"]);
        let output = Project::artifact_args(&mut cmd).output().unwrap();
        assert!(output.status.success());

        let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let entries = plan["plan"]["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["version"], "1.2.3-dev");
    }

    #[test]
    fn test_publish_dry_run_uploads_nothing() {
        let project = Project::new();

        let mut cmd = project.ci_cmd("feature-x");
        cmd.args(["publish", "--dry-run"]);
        Project::artifact_args(&mut cmd)
            .assert()
            .success()
            .stdout(predicate::str::contains("1.2.3-SNAPSHOT"))
            .stdout(predicate::str::contains("Dry run complete"));

        assert!(!project.counter_file().exists());
    }

    #[test]
    fn test_missing_artifact_fails_before_consuming_counter() {
        let project = Project::new();

        project
            .ci_cmd("feature-x")
            .args(["publish", "--jar", "build/libs/fiber.jar"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("sources"));

        assert!(!project.counter_file().exists());
    }

    #[test]
    fn test_unreachable_repository_reports_failure() {
        let project = Project::new();

        let mut cmd = project.ci_cmd("feature-x");
        cmd.arg("publish");
        Project::artifact_args(&mut cmd)
            .assert()
            .failure()
            .stderr(predicate::str::contains("main 1.2.3-1 failed"))
            .stderr(predicate::str::contains("snapshot 1.2.3-SNAPSHOT failed"));

        // The build number was issued before the upload and stays consumed
        let counters: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(project.counter_file()).unwrap())
                .unwrap();
        assert_eq!(counters["counters"]["1.2.3-feature-x"]["value"], 1);
    }
}
