//! Conda Invocation
//!
//! The [`CondaCli`] trait is the single seam through which every conda
//! call flows. [`SystemCli`] spawns the real binary; tests substitute a
//! scripted implementation.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::config::HarnessConfig;
use crate::error::CondaError;

use super::commands::Subcommand;

/// Captured result of one conda invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or `None` when the process reported none
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Builds an output with an explicit exit code.
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            code,
        }
    }

    /// A successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(stdout, "", Some(0))
    }

    /// A failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self::new("", stderr, Some(code))
    }

    /// True unless an exit code was reported and it is non-zero.
    pub fn succeeded(&self) -> bool {
        self.code.map_or(true, |code| code == 0)
    }

    /// Iterates over stdout lines.
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.stdout.lines()
    }

    /// Converts a failed status into [`CondaError::CommandFailed`].
    pub fn into_result(self, command: &str, target: &str) -> Result<Self, CondaError> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(CondaError::CommandFailed {
                command: command.to_string(),
                target: target.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Something that can run a conda subcommand and capture its output.
pub trait CondaCli {
    /// Runs `<program> <subcommand> <args...>` to completion.
    fn invoke(&self, subcommand: Subcommand, args: &[String]) -> Result<CommandOutput, CondaError>;

    /// Name the tool prints in its own hints, e.g. `conda activate <env>`.
    fn program_name(&self) -> String {
        "conda".to_string()
    }
}

/// Runs the conda binary as a child process.
#[derive(Debug, Clone)]
pub struct SystemCli {
    program: PathBuf,
    root_prefix: Option<PathBuf>,
}

impl SystemCli {
    /// Creates a runner for the given binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            root_prefix: None,
        }
    }

    /// Creates a runner from harness settings.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            program: config.conda_binary(),
            root_prefix: config.root_prefix.clone(),
        }
    }

    /// Sets `MAMBA_ROOT_PREFIX` for every spawned process.
    pub fn with_root_prefix(mut self, root_prefix: impl Into<PathBuf>) -> Self {
        self.root_prefix = Some(root_prefix.into());
        self
    }

    /// Path of the binary this runner spawns.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(ref root) = self.root_prefix {
            cmd.env("MAMBA_ROOT_PREFIX", root);
        }
        cmd
    }
}

impl CondaCli for SystemCli {
    fn invoke(&self, subcommand: Subcommand, args: &[String]) -> Result<CommandOutput, CondaError> {
        let rendered = format!("{} {} {}", self.program_name(), subcommand, args.join(" "));
        if subcommand.is_mutating() {
            info!("Running: {}", rendered.trim_end());
        } else {
            debug!("Running: {}", rendered.trim_end());
        }

        let output = self
            .command()
            .arg(subcommand.as_str())
            .args(args)
            .output()
            .map_err(|source| CondaError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };

        debug!(
            "`{}` exited with {:?}:\n{}",
            rendered.trim_end(),
            result.code,
            result.stdout
        );

        Ok(result)
    }

    fn program_name(&self) -> String {
        self.program
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("conda")
            .to_string()
    }
}
