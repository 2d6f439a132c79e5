//! Conda Command Registry
//!
//! Subcommand names and flags used to build conda invocations.

use std::fmt;

/// Select an environment by name.
pub const NAME_FLAG: &str = "-n";

/// Select an environment by filesystem location.
pub const PREFIX_FLAG: &str = "--prefix";

/// Answer yes to every confirmation prompt.
pub const YES_FLAG: &str = "-y";

/// Remove every package, deleting the environment itself.
pub const ALL_FLAG: &str = "--all";

/// Skip the `create_default_packages` list from `.condarc`.
pub const NO_DEFAULT_PACKAGES_FLAG: &str = "--no-default-packages";

/// A conda subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subcommand {
    Activate,
    Create,
    Env,
    Install,
    List,
    Remove,
    Run,
    Search,
}

impl Subcommand {
    /// Returns the name as typed on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Create => "create",
            Self::Env => "env",
            Self::Install => "install",
            Self::List => "list",
            Self::Remove => "remove",
            Self::Run => "run",
            Self::Search => "search",
        }
    }

    /// Whether the subcommand changes the tool's on-disk state.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Create | Self::Install | Self::Remove)
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
