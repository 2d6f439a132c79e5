//! Scenario Harness Module
//!
//! Runs a suite of scenarios against a conda tool: each scenario builds
//! a fresh environment and checks that its packages can be found and
//! installed.
//!
//! # Structure
//!
//! - [`scenario`]: Scenario model, built-in suite and YAML loading
//! - [`validator`]: Validation rules checked before any tool call
//! - [`runner`]: The per-scenario state machine
//! - [`report`]: Outcomes, timings and JSON persistence

pub mod report;
pub mod runner;
pub mod scenario;
pub mod validator;

pub use report::{Outcome, ScenarioReport, SuiteReport};
pub use runner::ScenarioRunner;
pub use scenario::{load_scenarios, parse_scenarios, scenarios_to_yaml, Scenario};
pub use validator::validate_scenarios;
