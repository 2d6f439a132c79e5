//! Scenario Runner
//!
//! Drives each scenario through the same sequence:
//! 1. Remove a stale environment with the same name, if listed
//! 2. Create the environment and check the activation hint
//! 3. For each package: confirm the repositories offer it, install it,
//!    confirm the environment lists it
//! 4. Remove the environment again when cleanup is enabled
//!
//! The first failed check ends the scenario. Scenarios run one at a
//! time and never share state beyond the tool's own environment registry.

use std::time::Instant;

use chrono::Utc;
use log::{error, info, warn};

use crate::config::HarnessConfig;
use crate::environment::{CondaCli, CreateOptions, Environment, PackageQuery};
use crate::error::ScenarioFailure;

use super::report::{Outcome, ScenarioReport, SuiteReport};
use super::scenario::Scenario;

/// Runs scenarios against a conda tool.
///
/// # Example
///
/// ```rust,no_run
/// use condatest::config::HarnessConfig;
/// use condatest::environment::SystemCli;
/// use condatest::harness::{Scenario, ScenarioRunner};
///
/// let config = HarnessConfig::default();
/// let cli = SystemCli::from_config(&config);
/// let runner = ScenarioRunner::new(&cli, &config);
///
/// let report = runner.run_all(&Scenario::defaults());
/// println!("{}", report.summary());
/// ```
pub struct ScenarioRunner<'a> {
    cli: &'a dyn CondaCli,
    remove_env: bool,
    install_default_packages: bool,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(cli: &'a dyn CondaCli, config: &HarnessConfig) -> Self {
        Self {
            cli,
            remove_env: config.remove_env,
            install_default_packages: config.install_default_packages,
        }
    }

    /// Enables or disables removal of environments after each scenario.
    pub fn set_remove_env(&mut self, remove_env: bool) {
        self.remove_env = remove_env;
    }

    /// Runs every scenario in order and collects their reports.
    pub fn run_all(&self, scenarios: &[Scenario]) -> SuiteReport {
        info!(
            "Running {} scenarios (cleanup: {})",
            scenarios.len(),
            self.remove_env
        );

        let mut suite = SuiteReport::new();
        for scenario in scenarios {
            suite.record(self.run_timed(scenario));
        }

        info!(
            "Finished: {} passed, {} failed",
            suite.passed(),
            suite.failed()
        );
        suite
    }

    /// Runs one scenario and records its outcome and duration.
    pub fn run_timed(&self, scenario: &Scenario) -> ScenarioReport {
        let started_at = Utc::now();
        let start = Instant::now();

        let outcome = match self.run_scenario(scenario) {
            Ok(()) => {
                info!("Scenario '{}' passed", scenario.name);
                Outcome::Passed
            }
            Err(failure) => {
                error!("Scenario '{}' failed: {}", scenario.name, failure);
                Outcome::Failed(failure.to_string())
            }
        };

        ScenarioReport::new(scenario, started_at, start.elapsed(), outcome)
    }

    /// Runs one scenario, cleaning up afterwards when enabled.
    pub fn run_scenario(&self, scenario: &Scenario) -> Result<(), ScenarioFailure> {
        info!("Running scenario '{}' with packages {:?}", scenario.name, scenario.packages);

        let env = Environment::named(self.cli, scenario.name.as_str());
        let result = self.exercise(&env, scenario);

        if self.remove_env {
            if let Err(e) = env.remove() {
                warn!("Failed to clean up environment {}: {}", scenario.name, e);
            }
        }

        result
    }

    fn exercise(&self, env: &Environment<'_>, scenario: &Scenario) -> Result<(), ScenarioFailure> {
        let name = scenario.name.as_str();

        if env.exists() {
            info!("Environment {} already exists, removing it first", name);
            env.remove().map_err(|source| ScenarioFailure::StaleEnvironment {
                env: name.to_string(),
                source,
            })?;
        }

        let options = CreateOptions::default().with_default_packages(self.install_default_packages);
        let created = env.create(&options).map_err(|source| ScenarioFailure::Create {
            env: name.to_string(),
            source,
        })?;

        let hint = format!("{} activate {}", self.cli.program_name(), name);
        if !created.stdout.contains(&hint) {
            return Err(ScenarioFailure::MissingActivationHint {
                env: name.to_string(),
            });
        }

        let query = PackageQuery::new(self.cli);
        for package in &scenario.packages {
            if !query.is_package_available(package) {
                return Err(ScenarioFailure::PackageUnavailable {
                    package: package.clone(),
                });
            }

            env.install(package).map_err(|source| ScenarioFailure::Install {
                package: package.clone(),
                env: name.to_string(),
                source,
            })?;

            if !env.is_package_installed(package) {
                return Err(ScenarioFailure::PackageNotInstalled {
                    package: package.clone(),
                    env: name.to_string(),
                });
            }
        }

        Ok(())
    }
}
