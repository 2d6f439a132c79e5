//! Conda Environment Management
//!
//! Wraps the lifecycle of one isolated environment: existence checks,
//! creation, package installs, listing, isolated execution and removal.
//!
//! Nothing is cached. Every check re-runs the tool and scans its
//! line-oriented output.
//!
//! # Error Policy
//!
//! Queries (`exists`, `is_package_installed`, `is_package_importable`)
//! log failures and answer `false`. Everything else returns a
//! [`CondaError`] when the tool exits non-zero.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, error, info};

use crate::error::CondaError;

use super::cli::{CommandOutput, CondaCli};
use super::commands::{
    Subcommand, ALL_FLAG, NAME_FLAG, NO_DEFAULT_PACKAGES_FLAG, PREFIX_FLAG, YES_FLAG,
};
use super::package::PackageSpec;

/// How an environment is identified to the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvTarget {
    /// Registered under a name in the tool's envs directory
    Name(String),
    /// Located at an explicit filesystem path
    Prefix(PathBuf),
}

impl EnvTarget {
    /// A name derived from the current time, e.g. `env_1712345678901`.
    pub fn generated() -> Self {
        Self::Name(format!("env_{}", Utc::now().timestamp_millis()))
    }

    /// Arguments selecting this environment: `-n <name>` or `--prefix <path>`.
    pub fn selector_args(&self) -> Vec<String> {
        match self {
            Self::Name(name) => vec![NAME_FLAG.to_string(), name.clone()],
            Self::Prefix(path) => vec![PREFIX_FLAG.to_string(), path.display().to_string()],
        }
    }

    /// Whether a line of `env list` output describes this environment.
    ///
    /// Names must be followed by a space so `api` does not match `api2`.
    /// Prefixes compare as paths, so a trailing separator is ignored.
    pub fn matches_env_line(&self, line: &str) -> bool {
        match self {
            Self::Name(name) => line.starts_with(&format!("{} ", name)),
            Self::Prefix(path) => line
                .split_whitespace()
                .any(|field| Path::new(field) == path.as_path()),
        }
    }
}

impl fmt::Display for EnvTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Prefix(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Options for [`Environment::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Package specs installed at creation time
    pub packages: Vec<String>,
    /// Install the `.condarc` default packages as well
    pub install_default_packages: bool,
}

impl CreateOptions {
    /// Parses a comma-separated package list such as `"numpy,pandas=2.2.3"`.
    pub fn from_csv(packages: &str) -> Self {
        Self {
            packages: split_package_list(packages),
            install_default_packages: false,
        }
    }

    /// Sets whether default packages are installed.
    pub fn with_default_packages(mut self, install: bool) -> Self {
        self.install_default_packages = install;
        self
    }
}

/// Splits a comma-separated package list, dropping empty entries.
pub fn split_package_list(packages: &str) -> Vec<String> {
    packages
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A single conda environment, driven through a [`CondaCli`].
pub struct Environment<'a> {
    cli: &'a dyn CondaCli,
    target: EnvTarget,
}

impl<'a> Environment<'a> {
    pub fn new(cli: &'a dyn CondaCli, target: EnvTarget) -> Self {
        debug!("Tracking environment {}", target);
        Self { cli, target }
    }

    /// An environment identified by name.
    pub fn named(cli: &'a dyn CondaCli, name: impl Into<String>) -> Self {
        Self::new(cli, EnvTarget::Name(name.into()))
    }

    /// An environment located at `prefix`.
    pub fn at_prefix(cli: &'a dyn CondaCli, prefix: impl Into<PathBuf>) -> Self {
        Self::new(cli, EnvTarget::Prefix(prefix.into()))
    }

    /// An environment with a freshly generated name.
    pub fn generated(cli: &'a dyn CondaCli) -> Self {
        Self::new(cli, EnvTarget::generated())
    }

    pub fn target(&self) -> &EnvTarget {
        &self.target
    }

    /// The environment name, if identified by one.
    pub fn name(&self) -> Option<&str> {
        match self.target {
            EnvTarget::Name(ref name) => Some(name),
            EnvTarget::Prefix(_) => None,
        }
    }

    /// The environment prefix, if identified by one.
    pub fn prefix(&self) -> Option<&Path> {
        match self.target {
            EnvTarget::Prefix(ref path) => Some(path),
            EnvTarget::Name(_) => None,
        }
    }

    /// Checks whether the tool lists this environment.
    pub fn exists(&self) -> bool {
        debug!("Checking if environment {} exists", self.target);
        let output = match self.cli.invoke(Subcommand::Env, &[Subcommand::List.to_string()]) {
            Ok(output) => output,
            Err(e) => {
                error!("Failed to list environments: {}", e);
                return false;
            }
        };

        if !output.succeeded() {
            error!("Failed to list environments: {}", output.stderr.trim());
            return false;
        }

        output.lines().any(|line| self.target.matches_env_line(line))
    }

    /// Removes the environment and everything in it.
    pub fn remove(&self) -> Result<CommandOutput, CondaError> {
        info!("Removing environment {}", self.target);
        let mut args = self.target.selector_args();
        args.push(ALL_FLAG.to_string());
        args.push(YES_FLAG.to_string());

        self.run_checked(Subcommand::Remove, &args)
    }

    /// Creates the environment, optionally with packages.
    pub fn create(&self, options: &CreateOptions) -> Result<CommandOutput, CondaError> {
        info!(
            "Creating environment {} with packages: {:?}",
            self.target, options.packages
        );

        let mut args = vec![YES_FLAG.to_string()];
        if !options.install_default_packages {
            args.push(NO_DEFAULT_PACKAGES_FLAG.to_string());
        }
        args.extend(self.target.selector_args());
        args.extend(options.packages.iter().cloned());

        let output = self.run_checked(Subcommand::Create, &args)?;
        debug!("Output: {}", output.stdout);
        Ok(output)
    }

    /// Creates the environment and confirms every requested package is listed.
    ///
    /// All packages are checked; the error names each one that is missing.
    pub fn create_verified(&self, options: &CreateOptions) -> Result<CommandOutput, CondaError> {
        let output = self.create(options)?;

        let missing: Vec<String> = options
            .packages
            .iter()
            .filter(|package| !self.is_package_installed(package))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(output)
        } else {
            error!(
                "Environment {} is missing packages after create: {:?}",
                self.target, missing
            );
            Err(CondaError::PackagesMissing {
                target: self.target.to_string(),
                missing,
            })
        }
    }

    /// Installs one package spec into the environment.
    pub fn install(&self, package: &str) -> Result<CommandOutput, CondaError> {
        info!("Installing package {} in environment {}", package, self.target);
        let mut args = self.target.selector_args();
        args.push(YES_FLAG.to_string());
        args.push(package.to_string());

        let output = self.run_checked(Subcommand::Install, &args)?;
        debug!("Output: {}", output.stdout);
        Ok(output)
    }

    /// Returns the raw package listing for the environment.
    pub fn list_packages(&self) -> Result<CommandOutput, CondaError> {
        self.run_checked(Subcommand::List, &self.target.selector_args())
    }

    /// Checks whether the listing contains `package` (with its version, if given).
    pub fn is_package_installed(&self, package: &str) -> bool {
        debug!(
            "Checking if package {} is installed in environment {}",
            package, self.target
        );
        let spec = PackageSpec::parse(package);

        self.list_packages()
            .map(|output| spec.matches_output(&output))
            .unwrap_or(false)
    }

    /// Runs `activate` for the environment.
    pub fn activate(&self) -> Result<CommandOutput, CondaError> {
        info!("Activating environment {}", self.target);
        self.run_checked(Subcommand::Activate, &[self.target.to_string()])
    }

    /// Runs a program inside the environment via `run`.
    pub fn run(&self, program_args: &[&str]) -> Result<CommandOutput, CondaError> {
        let mut args = self.target.selector_args();
        args.extend(program_args.iter().map(|s| s.to_string()));
        self.run_checked(Subcommand::Run, &args)
    }

    /// Checks that Python inside the environment can import the package.
    ///
    /// The module name is the package name with `-` replaced by `_`.
    pub fn is_package_importable(&self, package: &str) -> bool {
        let module = PackageSpec::parse(package).name.replace('-', "_");
        let statement = format!("import {}", module);

        debug!("Importing {} in environment {}", module, self.target);
        self.run(&["python", "-c", &statement]).is_ok()
    }

    fn run_checked(
        &self,
        subcommand: Subcommand,
        args: &[String],
    ) -> Result<CommandOutput, CondaError> {
        let command = format!("{} {}", self.cli.program_name(), subcommand);
        self.cli
            .invoke(subcommand, args)
            .and_then(|output| output.into_result(&command, &self.target.to_string()))
            .map_err(|e| {
                error!("{}", e);
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::testing::ScriptedCli;

    const ENV_LIST: &str = "\
# conda environments:
#
base                     /opt/conda
api2                     /opt/conda/envs/api2
datascience           *  /opt/conda/envs/datascience
                         /scratch/envs/unnamed
";

    const PACKAGE_LIST: &str = "\
# packages in environment at /opt/conda/envs/api:
#
# Name                    Version                   Build  Channel
certifi                   2025.1.31       py312h06a4308_0
requests                  2.32.3          py312h06a4308_1
urllib3                   2.3.0           py312h06a4308_0
";

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generated_name_format() {
        match EnvTarget::generated() {
            EnvTarget::Name(name) => {
                let millis = name.strip_prefix("env_").unwrap();
                assert!(millis.parse::<i64>().unwrap() > 0);
            }
            other => panic!("expected a name, got {other:?}"),
        }
    }

    #[test]
    fn test_selector_args() {
        assert_eq!(EnvTarget::Name("api".into()).selector_args(), args(&["-n", "api"]));
        assert_eq!(
            EnvTarget::Prefix("/tmp/env".into()).selector_args(),
            args(&["--prefix", "/tmp/env"])
        );
    }

    #[test]
    fn test_split_package_list() {
        assert_eq!(
            split_package_list("numpy, pandas=2.2.3,,matplotlib "),
            args(&["numpy", "pandas=2.2.3", "matplotlib"])
        );
        assert!(split_package_list("").is_empty());
    }

    #[test]
    fn test_exists_matches_named_env() {
        let cli = ScriptedCli::new().respond(Subcommand::Env, CommandOutput::ok(ENV_LIST));
        let env = Environment::named(&cli, "datascience");

        assert!(env.exists());
        assert_eq!(cli.calls_to(Subcommand::Env), vec![args(&["list"])]);
    }

    #[test]
    fn test_exists_guards_against_prefix_collision() {
        let cli = ScriptedCli::new().respond(Subcommand::Env, CommandOutput::ok(ENV_LIST));
        let env = Environment::named(&cli, "api");

        assert!(!env.exists());
    }

    #[test]
    fn test_exists_matches_prefix_env() {
        let cli = ScriptedCli::new()
            .respond(Subcommand::Env, CommandOutput::ok(ENV_LIST))
            .respond(Subcommand::Env, CommandOutput::ok(ENV_LIST));

        assert!(Environment::at_prefix(&cli, "/scratch/envs/unnamed").exists());
        assert!(!Environment::at_prefix(&cli, "/scratch/envs").exists());
    }

    #[test]
    fn test_exists_ignores_trailing_separator_in_prefix() {
        let cli = ScriptedCli::new().respond(Subcommand::Env, CommandOutput::ok(ENV_LIST));
        assert!(Environment::at_prefix(&cli, "/scratch/envs/unnamed/").exists());
    }

    #[test]
    fn test_exists_false_on_failed_listing() {
        let cli = ScriptedCli::new().respond(
            Subcommand::Env,
            CommandOutput::new(ENV_LIST, "CondaError", Some(1)),
        );
        assert!(!Environment::named(&cli, "datascience").exists());
    }

    #[test]
    fn test_exists_false_on_spawn_failure() {
        let cli = ScriptedCli::new().fail_spawn(Subcommand::Env);
        assert!(!Environment::named(&cli, "datascience").exists());
    }

    #[test]
    fn test_exists_with_missing_code_reads_output() {
        let cli = ScriptedCli::new().respond(Subcommand::Env, CommandOutput::new(ENV_LIST, "", None));
        assert!(Environment::named(&cli, "base").exists());
    }

    #[test]
    fn test_remove_named_args() {
        let cli = ScriptedCli::new();
        Environment::named(&cli, "api").remove().unwrap();

        assert_eq!(
            cli.calls_to(Subcommand::Remove),
            vec![args(&["-n", "api", "--all", "-y"])]
        );
    }

    #[test]
    fn test_remove_prefix_args() {
        let cli = ScriptedCli::new();
        Environment::at_prefix(&cli, "/tmp/env").remove().unwrap();

        assert_eq!(
            cli.calls_to(Subcommand::Remove),
            vec![args(&["--prefix", "/tmp/env", "--all", "-y"])]
        );
    }

    #[test]
    fn test_remove_failure_is_an_error() {
        let cli = ScriptedCli::new().respond(
            Subcommand::Remove,
            CommandOutput::failed(1, "EnvironmentLocationNotFound"),
        );
        let err = Environment::named(&cli, "api").remove().unwrap_err();
        assert!(err.to_string().contains("EnvironmentLocationNotFound"));
    }

    #[test]
    fn test_create_args_without_default_packages() {
        let cli = ScriptedCli::new();
        let env = Environment::named(&cli, "ds");

        env.create(&CreateOptions::from_csv("numpy,pandas")).unwrap();

        assert_eq!(
            cli.calls_to(Subcommand::Create),
            vec![args(&["-y", "--no-default-packages", "-n", "ds", "numpy", "pandas"])]
        );
    }

    #[test]
    fn test_create_args_with_default_packages() {
        let cli = ScriptedCli::new();
        let env = Environment::at_prefix(&cli, "/tmp/env");

        env.create(&CreateOptions::default().with_default_packages(true))
            .unwrap();

        assert_eq!(
            cli.calls_to(Subcommand::Create),
            vec![args(&["-y", "--prefix", "/tmp/env"])]
        );
    }

    #[test]
    fn test_create_returns_stdout() {
        let cli = ScriptedCli::new().respond(
            Subcommand::Create,
            CommandOutput::ok("# To activate this environment, use\n#\n#     $ conda activate api\n"),
        );
        let out = Environment::named(&cli, "api")
            .create(&CreateOptions::default())
            .unwrap();
        assert!(out.stdout.contains("conda activate api"));
    }

    #[test]
    fn test_create_verified_checks_every_package() {
        let cli = ScriptedCli::new()
            .respond(Subcommand::List, CommandOutput::ok(PACKAGE_LIST))
            .respond(Subcommand::List, CommandOutput::ok(PACKAGE_LIST))
            .respond(Subcommand::List, CommandOutput::ok(PACKAGE_LIST));
        let env = Environment::named(&cli, "api");

        let err = env
            .create_verified(&CreateOptions::from_csv("requests,numpy,pandas"))
            .unwrap_err();

        assert_eq!(cli.calls_to(Subcommand::List).len(), 3);
        match err {
            CondaError::PackagesMissing { target, missing } => {
                assert_eq!(target, "api");
                assert_eq!(missing, args(&["numpy", "pandas"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_verified_success() {
        let cli = ScriptedCli::new().respond(Subcommand::List, CommandOutput::ok(PACKAGE_LIST));
        let env = Environment::named(&cli, "api");

        assert!(env
            .create_verified(&CreateOptions::from_csv("requests=2.32.3"))
            .is_ok());
    }

    #[test]
    fn test_install_args() {
        let cli = ScriptedCli::new();
        Environment::named(&cli, "api").install("requests=2.32.3").unwrap();

        assert_eq!(
            cli.calls_to(Subcommand::Install),
            vec![args(&["-n", "api", "-y", "requests=2.32.3"])]
        );
    }

    #[test]
    fn test_install_failure_is_an_error() {
        let cli = ScriptedCli::new().respond(
            Subcommand::Install,
            CommandOutput::failed(1, "PackagesNotFoundError: nope"),
        );
        let result = Environment::named(&cli, "api").install("nope");
        assert!(matches!(result, Err(CondaError::CommandFailed { .. })));
    }

    #[test]
    fn test_is_package_installed() {
        let cli = ScriptedCli::new()
            .respond(Subcommand::List, CommandOutput::ok(PACKAGE_LIST))
            .respond(Subcommand::List, CommandOutput::ok(PACKAGE_LIST))
            .respond(Subcommand::List, CommandOutput::ok(PACKAGE_LIST));
        let env = Environment::named(&cli, "api");

        assert!(env.is_package_installed("requests"));
        assert!(env.is_package_installed("requests=2.32.3"));
        assert!(!env.is_package_installed("requests=2.31.0"));
        assert_eq!(cli.calls_to(Subcommand::List)[0], args(&["-n", "api"]));
    }

    #[test]
    fn test_is_package_installed_false_on_failed_listing() {
        let cli = ScriptedCli::new().respond(
            Subcommand::List,
            CommandOutput::new(PACKAGE_LIST, "EnvironmentLocationNotFound", Some(1)),
        );
        assert!(!Environment::named(&cli, "api").is_package_installed("requests"));
    }

    #[test]
    fn test_is_package_installed_false_on_spawn_failure() {
        let cli = ScriptedCli::new().fail_spawn(Subcommand::List);
        let env = Environment::named(&cli, "api");

        assert!(!env.is_package_installed("requests"));
        assert!(matches!(env.list_packages(), Err(CondaError::Spawn { .. })));
    }

    #[test]
    fn test_activate_uses_target() {
        let cli = ScriptedCli::new();
        Environment::at_prefix(&cli, "/tmp/env").activate().unwrap();
        assert_eq!(cli.calls_to(Subcommand::Activate), vec![args(&["/tmp/env"])]);
    }

    #[test]
    fn test_is_package_importable() {
        let cli = ScriptedCli::new()
            .respond(Subcommand::Run, CommandOutput::ok(""))
            .respond(
                Subcommand::Run,
                CommandOutput::failed(1, "ModuleNotFoundError: No module named 'typing_extensions'"),
            );
        let env = Environment::named(&cli, "api");

        assert!(env.is_package_importable("requests=2.32.3"));
        assert!(!env.is_package_importable("typing-extensions"));

        let calls = cli.calls_to(Subcommand::Run);
        assert_eq!(calls[0], args(&["-n", "api", "python", "-c", "import requests"]));
        assert_eq!(
            calls[1],
            args(&["-n", "api", "python", "-c", "import typing_extensions"])
        );
    }

    #[test]
    fn test_name_and_prefix_accessors() {
        let cli = ScriptedCli::new();
        let named = Environment::named(&cli, "api");
        assert_eq!(named.name(), Some("api"));
        assert!(named.prefix().is_none());

        let located = Environment::at_prefix(&cli, "/tmp/env");
        assert!(located.name().is_none());
        assert_eq!(located.prefix(), Some(Path::new("/tmp/env")));
    }
}
