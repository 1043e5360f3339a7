//! hrm-probe CLI library
//!
//! Argument parsing, console output and suite execution behind the
//! `hrm-probe` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, RunArgs, ScenarioGroup, SuiteArgs, TabArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{check_line, scenario_line, ProgressReporter};
pub use runner::{launch_browser, load_suite_config, write_sections, Plan, SuiteRunner, TOUR_SCENARIO};
