//! Harness Configuration
//!
//! Explicit settings handed to the conda CLI wrapper and the scenario
//! runner.
//!
//! # Tool Resolution Priority
//!
//! The conda binary is resolved in the following order:
//! 1. `CONDA_EXE` environment variable (set by an activated conda shell)
//! 2. System PATH: `which conda`
//! 3. The bare name `conda`, left to the OS to resolve at spawn time

use std::path::PathBuf;
use std::process::Command;

use log::{info, warn};
use once_cell::sync::Lazy;

/// Environment variable overriding the cleanup flag.
pub const REMOVE_ENV_VAR: &str = "CONDATEST_REMOVE_ENV";

/// Lazily-initialized path to the conda binary.
pub static CONDA_PATH: Lazy<PathBuf> =
    Lazy::new(|| resolve_conda(std::env::var("CONDA_EXE").ok()));

/// Resolves the conda binary from a `CONDA_EXE` value, then PATH, then the bare name.
pub fn resolve_conda(conda_exe: Option<String>) -> PathBuf {
    if let Some(exe) = conda_exe {
        let path = PathBuf::from(exe.trim());
        if path.exists() {
            info!("Using conda from CONDA_EXE: {}", path.display());
            return path;
        }
        warn!("CONDA_EXE points to a missing file: {}", path.display());
    }

    if let Ok(output) = Command::new("which").arg("conda").output() {
        if output.status.success() {
            let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path_str.is_empty() {
                let system_path = PathBuf::from(path_str);
                info!("Using system conda: {}", system_path.display());
                return system_path;
            }
        }
    }

    warn!("conda binary not found via CONDA_EXE or PATH, falling back to 'conda'");
    PathBuf::from("conda")
}

/// Settings for a harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// conda (or conda-compatible) executable; discovered when unset
    pub conda_path: Option<PathBuf>,

    /// Exported as `MAMBA_ROOT_PREFIX` to every child process when set
    pub root_prefix: Option<PathBuf>,

    /// Remove created environments after each scenario
    pub remove_env: bool,

    /// Let `create` install the `.condarc` default packages
    pub install_default_packages: bool,

    /// YAML scenario file; the built-in suite runs when absent
    pub scenario_file: Option<PathBuf>,

    /// Where to write the JSON run report
    pub report_path: Option<PathBuf>,

    /// Enable debug logging
    pub verbose: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            conda_path: None,
            root_prefix: None,
            remove_env: true,
            install_default_packages: false,
            scenario_file: None,
            report_path: None,
            verbose: false,
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration for a specific conda binary with default settings.
    pub fn with_conda(conda_path: impl Into<PathBuf>) -> Self {
        Self {
            conda_path: Some(conda_path.into()),
            root_prefix: None,
            remove_env: true,
            install_default_packages: false,
            scenario_file: None,
            report_path: None,
            verbose: false,
        }
    }

    /// The configured binary, or the discovered one.
    pub fn conda_binary(&self) -> PathBuf {
        self.conda_path
            .clone()
            .unwrap_or_else(|| CONDA_PATH.to_path_buf())
    }

    /// Builds the default configuration, then applies environment overrides.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();
        config.apply_remove_env(std::env::var(REMOVE_ENV_VAR).ok().as_deref())?;
        Ok(config)
    }

    /// Applies a `CONDATEST_REMOVE_ENV` value, if one was set.
    pub fn apply_remove_env(&mut self, value: Option<&str>) -> Result<(), String> {
        if let Some(value) = value {
            self.remove_env = parse_bool(value)
                .ok_or_else(|| format!("Invalid {} value: {}", REMOVE_ENV_VAR, value))?;
        }
        Ok(())
    }
}

/// Parses a boolean flag value the way the test-runner option accepts it.
///
/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`, ignoring case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
