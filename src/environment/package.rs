//! Package Specifications and Repository Queries
//!
//! A package spec is `name` or `name=version`. Matching against conda's
//! line-oriented output is prefix based on the name and substring based
//! on the version, so `1.2` also matches a `1.20` line.

use std::fmt;

use log::{debug, error, info};

use crate::error::CondaError;

use super::cli::{CommandOutput, CondaCli};
use super::commands::Subcommand;

/// A package name with an optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    /// Splits `spec` on the first `=`.
    ///
    /// Extra `=` characters are stripped from the version (`numpy==2.2.4`
    /// reads as version `2.2.4`). An empty version counts as none.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        match spec.split_once('=') {
            Some((name, version)) => {
                let version = version.trim_start_matches('=').trim();
                Self {
                    name: name.trim().to_string(),
                    version: (!version.is_empty()).then(|| version.to_string()),
                }
            }
            None => Self {
                name: spec.to_string(),
                version: None,
            },
        }
    }

    /// True if `line` starts with the name and contains the version, if any.
    pub fn matches_line(&self, line: &str) -> bool {
        if !line.starts_with(&self.name) {
            return false;
        }
        match self.version {
            Some(ref version) => line.contains(version.as_str()),
            None => true,
        }
    }

    /// True if any stdout line of `output` matches.
    pub fn matches_output(&self, output: &CommandOutput) -> bool {
        output.lines().any(|line| self.matches_line(line))
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(ref version) => write!(f, "{}={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// Queries the package repositories configured for the tool.
pub struct PackageQuery<'a> {
    cli: &'a dyn CondaCli,
}

impl<'a> PackageQuery<'a> {
    pub fn new(cli: &'a dyn CondaCli) -> Self {
        Self { cli }
    }

    /// Runs `search <name>` with any version suffix removed.
    pub fn search(&self, package: &str) -> Result<CommandOutput, CondaError> {
        let spec = PackageSpec::parse(package);
        debug!("Searching repositories for {}", spec.name);
        self.cli
            .invoke(Subcommand::Search, &[spec.name.clone()])?
            .into_result(&format!("{} search", self.cli.program_name()), &spec.name)
    }

    /// Checks whether the repositories offer `package`.
    ///
    /// Any failure to search is logged and reported as unavailable.
    pub fn is_package_available(&self, package: &str) -> bool {
        let spec = PackageSpec::parse(package);
        match self.search(package) {
            Ok(output) => {
                let found = spec.matches_output(&output);
                info!(
                    "Package {} {} in repositories",
                    spec,
                    if found { "found" } else { "not found" }
                );
                found
            }
            Err(e) => {
                error!("Failed to search for package {}: {}", spec, e);
                false
            }
        }
    }
}
