//! condatest - conda Environment Test Harness
//!
//! Drives a conda-compatible command-line tool to create isolated
//! environments, install packages into them and verify the result by
//! reading the tool's own listings.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`environment`]: Command registry, invocation seam, environment and package wrappers
//! - [`harness`]: Scenario model, validation, runner and reports
//! - [`config`]: Explicit harness configuration and tool discovery
//! - [`error`]: Typed failures for tool calls and scenarios
//!
//! # Example
//!
//! ```rust,no_run
//! use condatest::config::HarnessConfig;
//! use condatest::environment::{Environment, SystemCli};
//!
//! let config = HarnessConfig::default();
//! let cli = SystemCli::from_config(&config);
//!
//! let env = Environment::named(&cli, "api");
//! if !env.exists() {
//!     env.create(&Default::default()).expect("create failed");
//! }
//! env.install("requests=2.32.3").expect("install failed");
//! assert!(env.is_package_installed("requests=2.32.3"));
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod harness;

// Re-export commonly used types
pub use config::HarnessConfig;
pub use environment::{CondaCli, Environment, PackageQuery, SystemCli};
pub use error::{CondaError, ScenarioFailure};
pub use harness::{Scenario, ScenarioRunner, SuiteReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "condatest";
