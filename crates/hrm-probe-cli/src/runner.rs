//! Suite execution: configuration, fixture planning, browser launch, report

use crate::commands::{ScenarioGroup, SuiteArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use hrm_probe::{
    login_matrix, BrowserDriver, DriverConfig, ProbeResult, Row, Scenario, ScenarioRunner,
    Section, SheetReader, SuiteConfig, SuiteReport,
};
use std::io::Write;
use tracing::{debug, info};

/// Name of the tour scenario run by `run tabs`
pub const TOUR_SCENARIO: &str = "Navigate every section";

/// Scenarios paired with the fixture row each one logs in with
pub type Plan = Vec<(Scenario, Row)>;

/// Load the YAML file named by `--config` (if any) and apply flag overrides
///
/// # Errors
///
/// Returns error if the file cannot be read or the result is invalid
pub fn load_suite_config(args: &SuiteArgs) -> CliResult<SuiteConfig> {
    let base = match args.config_file {
        Some(ref path) => {
            debug!(path = %path.display(), "loading configuration file");
            SuiteConfig::load(path)?
        }
        None => SuiteConfig::default(),
    };
    let config = args.apply(base);
    config.validate()?;
    Ok(config)
}

/// Launch chromium for one scenario
#[cfg(feature = "browser")]
pub fn launch_browser(config: &DriverConfig) -> ProbeResult<hrm_probe::CdpDriver> {
    hrm_probe::CdpDriver::launch(config)
}

/// Launch chromium for one scenario
#[cfg(not(feature = "browser"))]
pub fn launch_browser(_config: &DriverConfig) -> ProbeResult<hrm_probe::MockDriver> {
    Err(hrm_probe::ProbeError::BrowserLaunchError {
        message: "hrm-probe was built without the `browser` feature".to_string(),
    })
}

/// Runs scenario groups and reports their outcomes
#[derive(Debug)]
pub struct SuiteRunner {
    config: SuiteConfig,
    cli: CliConfig,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a runner
    #[must_use]
    pub fn new(config: SuiteConfig, cli: CliConfig) -> Self {
        let reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet())
            .with_verbose(cli.verbosity.is_verbose());
        Self {
            config,
            cli,
            reporter,
        }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    fn open_fixture(&self) -> CliResult<(SheetReader, String)> {
        let reader = SheetReader::open(&self.config.fixture)?;
        let sheet = reader.resolve_sheet(&self.config.sheet)?;
        Ok((reader, sheet))
    }

    /// Read the fixture and pair each scenario of `group` with its row
    ///
    /// # Errors
    ///
    /// Returns error if the fixture cannot be read or holds no usable row
    pub fn plan(&self, group: ScenarioGroup) -> CliResult<Plan> {
        let (mut reader, sheet) = self.open_fixture()?;
        match group {
            ScenarioGroup::Login => {
                let plan = login_matrix(reader.read_all_rows(&sheet)?);
                if plan.is_empty() {
                    return Err(CliError::config(format!(
                        "no row in sheet '{sheet}' of {} has both a username and a password",
                        self.config.fixture.display()
                    )));
                }
                Ok(plan)
            }
            ScenarioGroup::Tabs => {
                let row = reader.login_row(&sheet, self.config.row)?;
                Ok(vec![(Scenario::tour(TOUR_SCENARIO), row)])
            }
        }
    }

    /// Read the login row for a single section check
    ///
    /// # Errors
    ///
    /// Returns error if the fixture row cannot be read
    pub fn plan_tab(&self, section: Section, expect: &str) -> CliResult<Plan> {
        let (mut reader, sheet) = self.open_fixture()?;
        let row = reader.login_row(&sheet, self.config.row)?;
        Ok(vec![(Scenario::tab(section, expect), row)])
    }

    /// Run every planned scenario, each in a freshly launched browser
    pub fn execute<D, L>(&mut self, suite_name: &str, plan: Plan, launch: L) -> SuiteReport
    where
        D: BrowserDriver,
        L: Fn(&DriverConfig) -> ProbeResult<D>,
    {
        let runner = ScenarioRunner::new(self.config.clone());
        let driver_config = self.config.driver_config();
        let mut report = SuiteReport::new(suite_name);

        self.reporter.header(suite_name);
        info!(suite = suite_name, scenarios = plan.len(), "suite started");

        for (scenario, row) in plan {
            self.reporter.start_scenario(&scenario.name);
            let outcome = runner.run_with(&scenario, &row, || launch(&driver_config));
            self.reporter.finish_scenario(&outcome);
            report.record(outcome);
        }

        info!(summary = %report.summary(), "suite finished");
        self.reporter.summary(&report);
        report
    }

    /// Write the JSON report if requested and turn failures into an error
    ///
    /// # Errors
    ///
    /// Returns error if the report cannot be written or a scenario failed
    pub fn finish(&self, report: &SuiteReport) -> CliResult<()> {
        if let Some(ref path) = self.cli.report {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            report.save_json(path)?;
            self.reporter
                .info(&format!("Report written to {}", path.display()));
        }

        if report.all_passed() {
            Ok(())
        } else {
            Err(CliError::ScenariosFailed {
                failed: report.failed_count(),
                total: report.total_count(),
            })
        }
    }
}

/// Write every section with the selectors tried for its menu entry
///
/// # Errors
///
/// Returns error if writing fails
pub fn write_sections(out: &mut impl Write) -> CliResult<()> {
    for section in Section::ALL {
        writeln!(out, "{section}")?;
        for selector in section.candidates().candidates() {
            writeln!(out, "  {selector}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{ColorChoice, Verbosity};
    use hrm_probe::{MockDriver, MockEffect, MockElement, Selector, HEADING_SELECTOR};
    use std::path::PathBuf;

    fn quiet_cli() -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::Quiet)
            .with_color(ColorChoice::Never)
    }

    fn suite_config() -> SuiteConfig {
        SuiteConfig::new()
            .with_base_url("https://hrm.test/")
            .with_timeout_ms(10)
            .with_cleanup(false)
    }

    fn login_app() -> MockDriver {
        MockDriver::new()
            .with_element(MockElement::new(Selector::name("username")))
            .with_element(MockElement::new(Selector::name("password")))
            .with_element(
                MockElement::new(Selector::css("button[type='submit']")).on_click(
                    MockEffect::Reveal(
                        MockElement::new(Selector::css(HEADING_SELECTOR)).with_text("Dashboard"),
                    ),
                ),
            )
    }

    fn admin() -> Row {
        Row::from_pairs([("Username", "Admin"), ("Password", "admin123")])
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults_without_file() {
            let config = load_suite_config(&SuiteArgs::default()).unwrap();
            assert_eq!(config, SuiteConfig::default());
        }

        #[test]
        fn test_file_then_flags() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("suite.yaml");
            std::fs::write(&path, "sheet: Logins\nrow: 2\n").unwrap();

            let args = SuiteArgs {
                config_file: Some(path),
                row: Some(5),
                ..SuiteArgs::default()
            };
            let config = load_suite_config(&args).unwrap();
            assert_eq!(config.sheet, "Logins");
            assert_eq!(config.row, Some(5));
        }

        #[test]
        fn test_invalid_override_rejected() {
            let args = SuiteArgs {
                base_url: Some("  ".to_string()),
                ..SuiteArgs::default()
            };
            assert!(load_suite_config(&args).is_err());
        }
    }

    mod plan_tests {
        use super::*;

        /// One-sheet `.xlsx` holding text cells only
        fn write_fixture(path: &std::path::Path, rows: &[&[&str]]) {
            use std::io::Write;

            let mut cells = String::new();
            for (r, row) in rows.iter().enumerate() {
                cells.push_str(&format!(r#"<row r="{}">"#, r + 1));
                for (c, text) in row.iter().enumerate() {
                    let col = char::from(b'A' + c as u8);
                    cells.push_str(&format!(
                        r#"<c r="{col}{}" t="inlineStr"><is><t>{text}</t></is></c>"#,
                        r + 1
                    ));
                }
                cells.push_str("</row>");
            }

            let parts = [
                (
                    "_rels/.rels",
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
                ),
                (
                    "xl/workbook.xml",
                    r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
                ),
                (
                    "xl/_rels/workbook.xml.rels",
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
                ),
                (
                    "xl/worksheets/sheet1.xml",
                    format!(
                        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{cells}</sheetData></worksheet>"#
                    ),
                ),
            ];

            let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            for (name, body) in parts {
                zip.start_file(name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }

        fn fixture_config(dir: &std::path::Path) -> SuiteConfig {
            let path = dir.join("TestData.xlsx");
            write_fixture(
                &path,
                &[
                    &["Username", "Password"],
                    &["Guest", ""],
                    &["Admin", "admin123"],
                ],
            );
            suite_config().with_fixture(path)
        }

        #[test]
        fn test_tabs_default_to_first_row_with_credentials() {
            let dir = tempfile::tempdir().unwrap();
            let runner = SuiteRunner::new(fixture_config(dir.path()), quiet_cli());

            let plan = runner.plan(ScenarioGroup::Tabs).unwrap();
            assert_eq!(plan.len(), 1);
            assert_eq!(plan[0].0.name, TOUR_SCENARIO);
            assert_eq!(plan[0].1.get("Username"), Some("Admin"));

            let plan = runner.plan_tab(Section::Pim, "PIM").unwrap();
            assert_eq!(plan[0].1.get("Username"), Some("Admin"));
        }

        #[test]
        fn test_explicit_row_wins() {
            let dir = tempfile::tempdir().unwrap();
            let config = fixture_config(dir.path()).with_row(1);
            let runner = SuiteRunner::new(config, quiet_cli());

            let plan = runner.plan(ScenarioGroup::Tabs).unwrap();
            assert_eq!(plan[0].1.get("Username"), Some("Guest"));
        }

        #[test]
        fn test_login_plan_skips_rows_without_credentials() {
            let dir = tempfile::tempdir().unwrap();
            let runner = SuiteRunner::new(fixture_config(dir.path()), quiet_cli());

            let plan = runner.plan(ScenarioGroup::Login).unwrap();
            assert_eq!(plan.len(), 1);
            assert_eq!(plan[0].1.get("Password"), Some("admin123"));
        }

        #[test]
        fn test_missing_fixture_fails_before_launch() {
            let config = suite_config().with_fixture(PathBuf::from("/nonexistent/TestData.xlsx"));
            let runner = SuiteRunner::new(config, quiet_cli());
            let err = runner.plan(ScenarioGroup::Tabs).unwrap_err();
            assert!(err.to_string().contains("spreadsheet"));
        }
    }

    mod execute_tests {
        use super::*;

        #[test]
        fn test_launch_per_scenario() {
            let launches = std::cell::Cell::new(0);
            let mut runner = SuiteRunner::new(suite_config(), quiet_cli());
            let plan = vec![
                (Scenario::login("first"), admin()),
                (Scenario::login("second"), admin()),
            ];
            let report = runner.execute("login", plan, |_| {
                launches.set(launches.get() + 1);
                Ok(login_app())
            });

            assert_eq!(launches.get(), 2);
            assert!(report.all_passed(), "{}", report.summary());
            assert!(runner.finish(&report).is_ok());
        }

        #[test]
        fn test_failures_become_error_and_report_is_written() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested/report.json");
            let mut runner = SuiteRunner::new(suite_config(), quiet_cli().with_report(&path));

            let report = runner.execute(
                "tabs",
                vec![(Scenario::tab(Section::Pim, "PIM"), admin())],
                |_| Ok(login_app()),
            );
            let err = runner.finish(&report).unwrap_err();

            assert!(matches!(
                err,
                CliError::ScenariosFailed {
                    failed: 1,
                    total: 1
                }
            ));
            let saved = SuiteReport::load_json(&path).unwrap();
            assert_eq!(saved.failed_count(), 1);
        }
    }

    #[test]
    fn test_write_sections() {
        let mut out = Vec::new();
        write_sections(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Admin\n"));
        assert!(text.contains("My Info\n  xpath=//span[normalize-space()='My Info']"));
        assert!(text.contains("xpath=//a[contains(@href,'viewMyDetails')]"));
    }
}
