//! Environment-derived inputs, captured once per run.

use super::CiSettings;
use crate::publish::Credentials;

/// Remote prefix CI servers put in front of branch names (`origin/master`)
const REMOTE_PREFIX: &str = "origin/";

/// Snapshot of the environment variables a run depends on
///
/// Every field is optional and absence is a distinct, valid state: an empty
/// variable is treated exactly like an unset one.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Current branch, with any `origin/` prefix removed
    pub branch: Option<String>,
    /// CI build identity; its presence is what marks a CI run
    pub build_id: Option<String>,
    /// Repository password
    pub password: Option<String>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("branch", &self.branch)
            .field("build_id", &self.build_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Environment {
    /// Read the configured variables from the process environment
    pub fn capture(ci: &CiSettings, password_env: &str) -> Self {
        Self::from_lookup(ci, password_env, |name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(ci: &CiSettings, password_env: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            branch: read(&ci.branch_var).and_then(|b| normalize_branch(&b)),
            build_id: read(&ci.build_var),
            // Passwords are taken verbatim
            password: lookup(password_env).filter(|v| !v.is_empty()),
        }
    }

    /// Whether this run is a CI build
    pub fn is_ci(&self) -> bool {
        self.build_id.is_some()
    }

    /// Replace the password (command line takes precedence over the environment)
    pub fn with_password(mut self, password: Option<String>) -> Self {
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.password = Some(password);
        }
        self
    }

    /// Credentials for the repository, if a password is available
    pub fn credentials(&self, username: &str) -> Option<Credentials> {
        self.password
            .as_ref()
            .map(|password| Credentials::new(username, password))
    }
}

fn normalize_branch(raw: &str) -> Option<String> {
    let branch = raw.strip_prefix(REMOTE_PREFIX).unwrap_or(raw);
    (!branch.is_empty()).then(|| branch.to_string())
}
