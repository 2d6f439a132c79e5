//! Error Types
//!
//! Failures raised while driving the conda tool and while running
//! test scenarios.

use thiserror::Error;

/// Errors produced by conda invocations.
#[derive(Debug, Error)]
pub enum CondaError {
    /// The tool binary could not be started at all.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported a non-zero exit code.
    #[error("`{command}` failed for {target} (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        target: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Environment creation succeeded but requested packages are not listed.
    #[error("packages missing from {target} after create: {}", .missing.join(", "))]
    PackagesMissing { target: String, missing: Vec<String> },
}

/// Reasons a single scenario fails.
#[derive(Debug, Error)]
pub enum ScenarioFailure {
    #[error("Failed to remove stale environment {env}: {source}")]
    StaleEnvironment {
        env: String,
        #[source]
        source: CondaError,
    },

    #[error("Failed to create environment {env}: {source}")]
    Create {
        env: String,
        #[source]
        source: CondaError,
    },

    #[error("Activation message not found in output for {env}")]
    MissingActivationHint { env: String },

    #[error("Package {package} not found in repositories")]
    PackageUnavailable { package: String },

    #[error("Failed to install {package} into {env}: {source}")]
    Install {
        package: String,
        env: String,
        #[source]
        source: CondaError,
    },

    #[error("Package {package} not found in {env} environment")]
    PackageNotInstalled { package: String, env: String },
}
