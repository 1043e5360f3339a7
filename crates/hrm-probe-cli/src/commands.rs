//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use hrm_probe::{Section, SuiteConfig};
use std::path::PathBuf;

/// hrm-probe: login and navigation acceptance checks for `OrangeHRM`
#[derive(Parser, Debug)]
#[command(name = "hrm-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Suite settings shared by every subcommand
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario group
    Run(RunArgs),

    /// Log in, open one section and confirm its landing page
    Tab(TabArgs),

    /// List sections and the selectors tried for each menu entry
    Sections,

    /// Print the effective configuration as YAML
    Config,
}

/// Settings layered over the YAML configuration file
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SuiteArgs {
    /// YAML configuration file
    #[arg(long = "config", global = true, env = "HRM_PROBE_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Fixture workbook (.xlsx, .xls, .ods)
    #[arg(long, global = true, env = "HRM_PROBE_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Sheet holding the fixture rows
    #[arg(long, global = true, env = "HRM_PROBE_SHEET")]
    pub sheet: Option<String>,

    /// Data row for single-row scenarios, from 1 [default: first row with credentials]
    #[arg(long, global = true, env = "HRM_PROBE_ROW")]
    pub row: Option<usize>,

    /// Application entry URL
    #[arg(long, global = true, env = "HRM_PROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Wait timeout in milliseconds
    #[arg(long, global = true, env = "HRM_PROBE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Show the browser window
    #[arg(long, global = true, env = "HRM_PROBE_HEADED")]
    pub headed: bool,

    /// Skip killing stray browser and spreadsheet processes
    #[arg(long, global = true, env = "HRM_PROBE_NO_CLEANUP")]
    pub no_cleanup: bool,

    /// Chromium executable
    #[arg(long, global = true, env = "HRM_PROBE_CHROMIUM")]
    pub chromium: Option<PathBuf>,

    /// Write the JSON suite report to this path
    #[arg(long, global = true, env = "HRM_PROBE_REPORT")]
    pub report: Option<PathBuf>,
}

impl SuiteArgs {
    /// Apply flags that were given on top of `config`
    #[must_use]
    pub fn apply(&self, mut config: SuiteConfig) -> SuiteConfig {
        if let Some(ref fixture) = self.fixture {
            config = config.with_fixture(fixture);
        }
        if let Some(ref sheet) = self.sheet {
            config = config.with_sheet(sheet);
        }
        if let Some(row) = self.row {
            config = config.with_row(row);
        }
        if let Some(ref url) = self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout_ms(timeout_ms);
        }
        if self.headed {
            config = config.with_headless(false);
        }
        if self.no_cleanup {
            config = config.with_cleanup(false);
        }
        if let Some(ref path) = self.chromium {
            config = config.with_chromium_path(path);
        }
        config
    }
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario group
    #[arg(value_enum)]
    pub group: ScenarioGroup,
}

/// Named scenario groups
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioGroup {
    /// One login per fixture row that has credentials
    Login,
    /// Log in with the configured row, then visit every section
    Tabs,
}

/// Arguments for the tab command
#[derive(Args, Debug)]
pub struct TabArgs {
    /// Section name, e.g. "PIM" or "my-info"
    #[arg(value_parser = parse_section)]
    pub section: Section,

    /// `/`-separated tokens expected in the heading and breadcrumb
    #[arg(long, short = 'e')]
    pub expect: String,
}

fn parse_section(value: &str) -> Result<Section, String> {
    value.parse::<Section>().map_err(|e| e.to_string())
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hrm-probe").chain(args.iter().copied())).unwrap()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_run_group() {
            let cli = parse(&["run", "tabs"]);
            match cli.command {
                Commands::Run(args) => assert_eq!(args.group, ScenarioGroup::Tabs),
                other => panic!("unexpected command {other:?}"),
            }
        }

        #[test]
        fn test_tab_section_is_lenient() {
            let cli = parse(&["tab", "my-info", "--expect", "PIM"]);
            match cli.command {
                Commands::Tab(args) => {
                    assert_eq!(args.section, Section::MyInfo);
                    assert_eq!(args.expect, "PIM");
                }
                other => panic!("unexpected command {other:?}"),
            }
        }

        #[test]
        fn test_unknown_section_rejected() {
            let err = Cli::try_parse_from(["hrm-probe", "tab", "Payroll", "--expect", "x"])
                .unwrap_err();
            assert!(err.to_string().contains("unknown section"));
        }

        #[test]
        fn test_tab_requires_expect() {
            assert!(Cli::try_parse_from(["hrm-probe", "tab", "PIM"]).is_err());
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = parse(&["sections", "-vv", "--color", "never", "--row", "2"]);
            assert_eq!(cli.verbose, 2);
            assert_eq!(ColorChoice::from(cli.color), ColorChoice::Never);
            assert_eq!(cli.suite.row, Some(2));
        }
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn test_no_flags_keeps_config() {
            let base = SuiteConfig::new().with_sheet("Logins");
            assert_eq!(SuiteArgs::default().apply(base.clone()), base);
        }

        #[test]
        fn test_flags_override() {
            let cli = parse(&[
                "config",
                "--fixture",
                "data/users.xlsx",
                "--base-url",
                "http://localhost:8080/",
                "--timeout-ms",
                "500",
                "--headed",
                "--no-cleanup",
            ]);
            let config = cli.suite.apply(SuiteConfig::new());
            assert_eq!(config.fixture, PathBuf::from("data/users.xlsx"));
            assert_eq!(config.base_url, "http://localhost:8080/");
            assert_eq!(config.timeout_ms, 500);
            assert!(!config.headless);
            assert!(!config.cleanup);
        }
    }
}
