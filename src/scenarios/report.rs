//! Run report.
//!
//! One entry per executed scenario with its outcome and duration, rendered as
//! a table for the terminal and optionally written as JSON.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::framework::error::Result;
use crate::scenarios::Scenario;

/// Outcome of one scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Passed,
    Skipped { reason: String },
    Failed { error: String },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Skipped { .. } => "SKIPPED",
            Outcome::Failed { .. } => "FAILED",
        }
    }

    fn detail(&self) -> &str {
        match self {
            Outcome::Passed => "",
            Outcome::Skipped { reason } => reason,
            Outcome::Failed { error } => error,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub scenario: String,
    pub labels: Vec<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_seconds: f64,
}

impl ScenarioResult {
    pub fn new(scenario: Scenario, outcome: Outcome, duration: Duration) -> Self {
        Self {
            scenario: scenario.name().to_string(),
            labels: scenario.labels().iter().map(|l| l.to_string()).collect(),
            outcome,
            duration_seconds: duration.as_secs_f64(),
        }
    }
}

/// Report of one run of the suite against one shoot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub project_namespace: String,
    pub shoot_name: String,
    pub started_at: Timestamp,
    pub results: Vec<ScenarioResult>,
}

impl RunReport {
    pub fn new(project_namespace: &str, shoot_name: &str) -> Self {
        Self {
            project_namespace: project_namespace.to_string(),
            shoot_name: shoot_name.to_string(),
            started_at: Timestamp::now(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    /// True if no scenario failed.
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .results
            .iter()
            .map(|r| r.scenario.len())
            .chain(std::iter::once("SCENARIO".len()))
            .max()
            .unwrap_or_default();

        writeln!(
            f,
            "{:<width$}  {:<7}  {:>10}  DETAIL",
            "SCENARIO", "RESULT", "DURATION"
        )?;
        for result in &self.results {
            writeln!(
                f,
                "{:<width$}  {:<7}  {:>9.1}s  {}",
                result.scenario,
                result.outcome.label(),
                result.duration_seconds,
                result.outcome.detail()
            )?;
        }
        write!(
            f,
            "{} passed, {} skipped, {} failed",
            self.count(|o| *o == Outcome::Passed),
            self.count(|o| matches!(o, Outcome::Skipped { .. })),
            self.failed()
        )
    }
}
