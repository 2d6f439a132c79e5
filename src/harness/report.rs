//! Run Reports
//!
//! Records the outcome and timing of each scenario, renders a text
//! summary and persists the whole run as JSON.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::scenario::Scenario;

/// Result of one scenario.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// Carries the failure message
    Failed(String),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Outcome and timing for a single scenario run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub name: String,
    pub packages: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: Outcome,
}

impl ScenarioReport {
    pub fn new(
        scenario: &Scenario,
        started_at: DateTime<Utc>,
        duration: Duration,
        outcome: Outcome,
    ) -> Self {
        Self {
            name: scenario.name.clone(),
            packages: scenario.packages.clone(),
            started_at,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            outcome,
        }
    }

    /// One summary line, e.g. `api          [requests]  PASS (1200 ms)`.
    pub fn summary_line(&self) -> String {
        let status = match self.outcome {
            Outcome::Passed => "PASS".to_string(),
            Outcome::Failed(ref reason) => format!("FAIL: {}", reason),
        };
        format!(
            "{} [{}]  {} ({} ms)",
            truncate(&self.name, 12),
            self.packages.join(", "),
            status,
            self.duration_ms
        )
    }
}

/// All scenario reports of one harness run, in execution order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    pub fn passed(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|r| r.outcome.is_passed())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    /// True when every recorded scenario passed.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Total time spent across scenarios.
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.scenarios.iter().map(|r| r.duration_ms).sum())
    }

    /// Generates a plain text summary of the run.
    pub fn summary(&self) -> String {
        let mut output = String::from("\nScenario Results:\n\n");

        for report in &self.scenarios {
            output.push_str(&report.summary_line());
            output.push('\n');
        }

        output.push_str(&format!(
            "\n{} passed, {} failed in {:.2?}\n",
            self.passed(),
            self.failed(),
            self.total_duration()
        ));
        output
    }

    /// Writes the report as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        info!("Saved run report to {}", path.display());
        Ok(())
    }

    /// Reads a report written by [`SuiteReport::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Pads or truncates a string to a fixed width.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
