//! Scenario Validation
//!
//! Rejects scenarios that could never pass before any conda process
//! is spawned.

use log::{info, warn};

use crate::environment::PackageSpec;

use super::scenario::Scenario;

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptySuite,
    EmptyName { index: usize },
    WhitespaceInName(String),
    EmptyPackageSpec { scenario: String },
    MissingPackageName { scenario: String, spec: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySuite => write!(f, "No scenarios defined"),
            Self::EmptyName { index } => {
                write!(f, "Scenario #{} has empty or whitespace-only name", index + 1)
            }
            Self::WhitespaceInName(name) => {
                write!(f, "Scenario '{}': environment names cannot contain whitespace", name)
            }
            Self::EmptyPackageSpec { scenario } => {
                write!(f, "Scenario '{}' has an empty package spec", scenario)
            }
            Self::MissingPackageName { scenario, spec } => {
                write!(f, "Scenario '{}': package spec '{}' has no name", scenario, spec)
            }
        }
    }
}

/// Validates a single scenario's fields.
fn validate_scenario(index: usize, scenario: &Scenario) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if scenario.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName { index });
        return errors;
    }

    // Listing output is matched on "<name> ", so a space would never match.
    if scenario.name.chars().any(char::is_whitespace) {
        errors.push(ValidationError::WhitespaceInName(scenario.name.clone()));
    }

    if scenario.packages.is_empty() {
        warn!("Scenario '{}' has no packages", scenario.name);
    }

    for spec in &scenario.packages {
        if spec.trim().is_empty() {
            errors.push(ValidationError::EmptyPackageSpec {
                scenario: scenario.name.clone(),
            });
        } else if PackageSpec::parse(spec).name.is_empty() {
            errors.push(ValidationError::MissingPackageName {
                scenario: scenario.name.clone(),
                spec: spec.clone(),
            });
        }
    }

    errors
}

/// Validates a scenario suite.
///
/// Duplicate names are allowed; scenarios run one after another and each
/// one starts by removing any environment left behind.
pub fn validate_scenarios(scenarios: &[Scenario]) -> Result<(), String> {
    info!("Validating {} scenarios", scenarios.len());

    if scenarios.is_empty() {
        return Err(ValidationError::EmptySuite.to_string());
    }

    let all_errors: Vec<ValidationError> = scenarios
        .iter()
        .enumerate()
        .flat_map(|(index, scenario)| validate_scenario(index, scenario))
        .collect();

    if !all_errors.is_empty() {
        let error_messages: Vec<String> = all_errors.iter().map(|e| e.to_string()).collect();
        return Err(error_messages.join("\n"));
    }

    Ok(())
}
