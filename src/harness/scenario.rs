//! Test Scenarios
//!
//! A scenario names an environment and the packages that must end up
//! installed in it.
//!
//! # Example YAML Format
//!
//! ```yaml
//! scenarios:
//!   - name: api
//!     packages: requests
//!
//!   - name: datascience
//!     packages:
//!       - numpy=2.2.4
//!       - pandas,matplotlib
//! ```

use std::error::Error;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::environment::split_package_list;

use super::validator::validate_scenarios;

/// One environment to build and the packages it must contain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Environment name
    pub name: String,

    /// Package specs (`name` or `name=version`), installed in order
    #[serde(deserialize_with = "package_list", default)]
    pub packages: Vec<String>,
}

/// Top-level layout of a scenario file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScenarioFile {
    pub scenarios: Vec<Scenario>,
}

/// Deserializes a string, comma-separated string, or array of strings.
fn package_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(split_package_list(&s)),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(split_package_list(&s)),
                _ => Err(<D::Error as de::Error>::custom("Expected string in package list")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|lists| lists.into_iter().flatten().collect()),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

impl Scenario {
    /// Creates a scenario with no packages.
    ///
    /// # Example
    ///
    /// ```
    /// use condatest::harness::Scenario;
    ///
    /// let scenario = Scenario::new("api").with_package("requests=2.32.3");
    /// assert_eq!(scenario.packages, vec!["requests=2.32.3"]);
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            packages: Vec::new(),
        }
    }

    /// Appends one package spec.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.packages.push(package.into());
        self
    }

    /// Replaces the package list.
    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }

    /// The suite run when no scenario file is given.
    pub fn defaults() -> Vec<Scenario> {
        vec![
            Scenario::new("api").with_package("requests"),
            Scenario::new("datascience")
                .with_package("numpy")
                .with_package("pandas")
                .with_package("matplotlib"),
            Scenario::new("api").with_package("requests=2.32.3"),
            Scenario::new("datascience")
                .with_package("numpy=2.2.4")
                .with_package("pandas=2.2.3")
                .with_package("matplotlib=3.10.1"),
        ]
    }
}

/// Parses and validates scenarios from YAML text.
pub fn parse_scenarios(yaml_content: &str) -> Result<Vec<Scenario>, Box<dyn Error>> {
    let file: ScenarioFile = serde_yaml::from_str(yaml_content).map_err(|e| {
        format!(
            "Failed to parse scenario YAML: {}. Check the file format.",
            e
        )
    })?;

    validate_scenarios(&file.scenarios)?;
    Ok(file.scenarios)
}

/// Loads scenarios from a YAML file.
///
/// # Example
///
/// ```rust,no_run
/// use condatest::harness::load_scenarios;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let scenarios = load_scenarios("scenarios.yaml")?;
///     println!("Loaded {} scenarios", scenarios.len());
///     Ok(())
/// }
/// ```
pub fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<Scenario>, Box<dyn Error>> {
    let path = path.as_ref();
    info!("Loading scenarios from: {}", path.display());

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read scenario file '{}': {}. Check that the file exists and is readable.",
            path.display(),
            e
        )
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    let scenarios = parse_scenarios(&yaml_content)?;
    info!("Parsed {} scenarios", scenarios.len());
    Ok(scenarios)
}

/// Renders scenarios back into the YAML file format.
pub fn scenarios_to_yaml(scenarios: &[Scenario]) -> Result<String, Box<dyn Error>> {
    let file = ScenarioFile {
        scenarios: scenarios.to_vec(),
    };
    Ok(serde_yaml::to_string(&file)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let scenarios = Scenario::defaults();
        assert_eq!(scenarios.len(), 4);
        assert_eq!(scenarios[0].name, "api");
        assert_eq!(scenarios[0].packages, vec!["requests"]);
        assert_eq!(
            scenarios[3].packages,
            vec!["numpy=2.2.4", "pandas=2.2.3", "matplotlib=3.10.1"]
        );
    }

    #[test]
    fn test_new_trims_name() {
        assert_eq!(Scenario::new("  api ").name, "api");
    }

    #[test]
    fn test_with_packages_replaces_list() {
        let scenario = Scenario::new("api")
            .with_package("numpy")
            .with_packages(split_package_list("requests, pandas"));
        assert_eq!(scenario.packages, vec!["requests", "pandas"]);
    }

    #[test]
    fn test_parse_single_string_packages() {
        let scenarios = parse_scenarios(
            r#"
scenarios:
  - name: api
    packages: requests
"#,
        )
        .unwrap();

        assert_eq!(scenarios, vec![Scenario::new("api").with_package("requests")]);
    }

    #[test]
    fn test_parse_list_with_comma_entries() {
        let scenarios = parse_scenarios(
            r#"
scenarios:
  - name: datascience
    packages:
      - numpy=2.2.4
      - "pandas, matplotlib"
"#,
        )
        .unwrap();

        assert_eq!(
            scenarios[0].packages,
            vec!["numpy=2.2.4", "pandas", "matplotlib"]
        );
    }

    #[test]
    fn test_parse_missing_packages_defaults_empty() {
        let scenarios = parse_scenarios("scenarios:\n  - name: bare\n").unwrap();
        assert!(scenarios[0].packages.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_string_package() {
        let result = parse_scenarios("scenarios:\n  - name: api\n    packages: [1, 2]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_runs_validation() {
        let result = parse_scenarios("scenarios:\n  - name: \"my env\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_scenarios_file_not_found() {
        let result = load_scenarios("/nonexistent/path/scenarios.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_scenarios_from_file() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("scenarios.yaml");
        std::fs::write(
            &path,
            "scenarios:\n  - name: api\n    packages: [requests=2.32.3]\n",
        )
        .unwrap();

        let scenarios = load_scenarios(&path).unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].packages, vec!["requests=2.32.3"]);
    }

    #[test]
    fn test_bundled_scenario_file_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/default.yaml");
        assert_eq!(load_scenarios(path).unwrap(), Scenario::defaults());
    }

    #[test]
    fn test_yaml_output_parses_back() {
        let yaml = scenarios_to_yaml(&Scenario::defaults()).unwrap();
        let parsed = parse_scenarios(&yaml).unwrap();
        assert_eq!(parsed, Scenario::defaults());
    }
}
