//! Environment Management Module
//!
//! Handles integration with conda for creating isolated environments
//! and checking which packages they (and the repositories) provide.

pub mod cli;
pub mod commands;
pub mod conda;
pub mod package;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::{CommandOutput, CondaCli, SystemCli};
pub use commands::Subcommand;
pub use conda::{split_package_list, CreateOptions, EnvTarget, Environment};
pub use package::{PackageQuery, PackageSpec};
