//! Reporter - scenario outcomes and the suite report.
//!
//! Every scenario yields a [`ScenarioOutcome`] whatever happened to it; the
//! suite collects them in a [`SuiteReport`] that renders a one-line summary
//! and serializes to JSON for CI artifacts.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::result::ProbeResult;
use crate::scenario::ScenarioState;

/// Result status of a scenario or a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Passed
    Passed,
    /// Failed
    Failed,
    /// Skipped (optional check that could not run)
    Skipped,
}

impl Status {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Outcome of one navigation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Section that was opened
    pub section: String,
    /// Expected tokens, `/`-separated
    pub expect: String,
    /// Status
    pub status: Status,
    /// Error text for failed or skipped checks
    pub error: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

impl CheckOutcome {
    /// Passing check
    #[must_use]
    pub fn passed(section: impl Into<String>, expect: impl Into<String>, duration: Duration) -> Self {
        Self {
            section: section.into(),
            expect: expect.into(),
            status: Status::Passed,
            error: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Failing check
    #[must_use]
    pub fn failed(
        section: impl Into<String>,
        expect: impl Into<String>,
        duration: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: Status::Failed,
            error: Some(error.into()),
            ..Self::passed(section, expect, duration)
        }
    }

    /// Skipped optional check
    #[must_use]
    pub fn skipped(
        section: impl Into<String>,
        expect: impl Into<String>,
        duration: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: Status::Skipped,
            error: Some(reason.into()),
            ..Self::passed(section, expect, duration)
        }
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub name: String,
    /// Status
    pub status: Status,
    /// Last state reached before teardown
    pub final_state: ScenarioState,
    /// Error message if failed
    pub error: Option<String>,
    /// Per-check results, in execution order
    pub checks: Vec<CheckOutcome>,
    /// Scenario duration in milliseconds
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    /// Whether the scenario passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.status.is_passed()
    }

    /// Number of checks with the given status
    #[must_use]
    pub fn checks_with(&self, status: Status) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

/// Collected outcomes of a suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Start time, seconds since the Unix epoch
    pub started_at: u64,
    /// Scenario outcomes in run order
    pub scenarios: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// Start a new report
    #[must_use]
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            started_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            scenarios: Vec::new(),
        }
    }

    /// Record a scenario outcome
    pub fn record(&mut self, outcome: ScenarioOutcome) {
        self.scenarios.push(outcome);
    }

    /// Get number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    /// Get number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.status.is_failed()).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Get pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.scenarios.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.scenarios.len() as f64
    }

    /// True when at least one scenario ran and none failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.scenarios.is_empty() && self.failed_count() == 0
    }

    /// Total time spent in scenarios
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.scenarios.iter().map(|s| s.duration_ms).sum())
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.scenarios
            .iter()
            .filter(|s| s.status.is_failed())
            .collect()
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%) in {:.1}s",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0,
            self.total_duration().as_secs_f64()
        )
    }

    /// Pretty JSON rendering
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails
    pub fn save_json(&self, path: &Path) -> ProbeResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a report written by [`Self::save_json`]
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing or malformed
    pub fn load_json(path: &Path) -> ProbeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
