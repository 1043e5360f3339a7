//! Console output and progress reporting

use console::{style, Style, Term};
use hrm_probe::{CheckOutcome, ScenarioOutcome, Status, SuiteReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Writes scenario progress and results to stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print every check, not only failures
    pub verbose: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
            verbose: false,
        }
    }

    /// Print passing checks too
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Show a spinner while a scenario runs
    pub fn start_scenario(&mut self, name: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(name.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.progress_bar = Some(spinner);
    }

    /// Stop the spinner and print the scenario result
    pub fn finish_scenario(&mut self, outcome: &ScenarioOutcome) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }

        let line = scenario_line(outcome);
        if outcome.passed() {
            self.success(&line);
        } else {
            self.failure(&line);
        }

        for check in &outcome.checks {
            match check.status {
                Status::Failed => self.detail(&check_line(check)),
                Status::Skipped if !self.quiet => self.warning(&check_line(check)),
                Status::Passed if self.verbose && !self.quiet => self.detail(&check_line(check)),
                _ => {}
            }
        }
        if let Some(ref error) = outcome.error {
            if outcome.checks.iter().all(|c| !c.status.is_failed()) {
                self.detail(error);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Indented follow-up line
    fn detail(&self, message: &str) {
        let text = if self.use_color {
            style(message).dim().to_string()
        } else {
            message.to_string()
        };
        let _ = self.term.write_line(&format!("    {text}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the suite summary
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");

        let passed = report.passed_count();
        let total = report.total_count();
        let duration_secs = report.total_duration().as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();

            let status = if report.all_passed() {
                passed_style.apply_to("PASSED")
            } else {
                failed_style.apply_to("FAILED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            ));
        } else {
            let status = if report.all_passed() { "PASSED" } else { "FAILED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed)"
            ));
        }
    }
}

/// `name (1.2s)` plus check counts when there are checks
#[must_use]
pub fn scenario_line(outcome: &ScenarioOutcome) -> String {
    let secs = Duration::from_millis(outcome.duration_ms).as_secs_f64();
    if outcome.checks.is_empty() {
        return format!("{} ({secs:.1}s)", outcome.name);
    }
    format!(
        "{} ({secs:.1}s, {} passed, {} skipped, {} failed)",
        outcome.name,
        outcome.checks_with(Status::Passed),
        outcome.checks_with(Status::Skipped),
        outcome.checks_with(Status::Failed),
    )
}

/// One line per check: section, expectation and any error
#[must_use]
pub fn check_line(check: &CheckOutcome) -> String {
    let label = match check.status {
        Status::Passed => "ok",
        Status::Failed => "failed",
        Status::Skipped => "skipped",
    };
    match check.error {
        Some(ref error) => format!("{} -> '{}' {label}: {error}", check.section, check.expect),
        None => format!("{} -> '{}' {label}", check.section, check.expect),
    }
}
