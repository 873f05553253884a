//! Command line argument parsing.

use crate::artifact::ArtifactPaths;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::error::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Version and publication coordinator for Maven artifacts
#[derive(Parser, Debug)]
#[command(
    name = "maven_release",
    version,
    about = "Version and publication coordinator for Maven artifacts",
    long_about = "Resolve build versions from a persistent build counter and publish jars \
to a Maven repository.

Outside CI (no BUILD_NUMBER) versions resolve to MAJOR.MINOR.PATCH-dev and the counter is \
never touched.

Usage:
  maven_release version --dry-run
  maven_release plan --json
  maven_release publish --jar build/libs/fiber.jar \\
      --sources build/libs/fiber-sources.jar --javadoc build/libs/fiber-javadoc.jar"
)]
pub struct Args {
    /// Configuration file
    #[arg(
        long,
        short = 'c',
        global = true,
        value_name = "PATH",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Show detailed progress
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Only print errors and requested output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the version this build resolves to; in CI this consumes a build number
    ///
    /// Under CI every call without --dry-run takes a new number from the counter, and
    /// `publish` takes another one. To print the version a following `publish` will use,
    /// run `version --dry-run`.
    Version {
        /// Show what would be issued without consuming a build number
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the publication plan without consuming a build number
    Plan {
        /// Emit JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Resolve the version, plan and upload
    Publish {
        /// Plan without consuming a build number or uploading
        #[arg(long)]
        dry_run: bool,

        /// Repository password, overrides the configured environment variable
        #[arg(long, value_name = "PASSWORD")]
        maven_pass: Option<String>,

        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// List persisted build counters
    Counter {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Version { .. } => "version",
            Command::Plan { .. } => "plan",
            Command::Publish { .. } => "publish",
            Command::Counter { .. } => "counter",
        }
    }
}

/// Artifact path overrides
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ArtifactArgs {
    /// Bundled library jar
    #[arg(long, value_name = "PATH")]
    pub jar: Option<PathBuf>,

    /// Sources jar
    #[arg(long, value_name = "PATH")]
    pub sources: Option<PathBuf>,

    /// Javadoc jar
    #[arg(long, value_name = "PATH")]
    pub javadoc: Option<PathBuf>,
}

impl ArtifactArgs {
    /// Overrides as artifact paths
    pub fn to_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            primary: self.jar.clone(),
            sources: self.sources.clone(),
            javadoc: self.javadoc.clone(),
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        let invalid = |reason: &str| CliError::InvalidArguments {
            reason: reason.to_string(),
        };
        if self.config.as_os_str().is_empty() {
            return Err(invalid("--config must not be empty"));
        }
        if let Command::Publish {
            maven_pass: Some(pass),
            ..
        } = &self.command
            && pass.is_empty()
        {
            return Err(invalid("--maven-pass must not be empty"));
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print message only in verbose mode
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}
