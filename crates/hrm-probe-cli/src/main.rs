//! hrm-probe: `OrangeHRM` acceptance checks from the command line
//!
//! ## Usage
//!
//! ```bash
//! hrm-probe run login                       # One login per fixture row
//! hrm-probe run tabs --report out.json      # Visit every section
//! hrm-probe tab PIM --expect "PIM"          # Single section check
//! hrm-probe sections                        # List sections and selectors
//! hrm-probe config --config suite.yaml      # Show effective configuration
//! ```

use clap::Parser;
use hrm_probe::SuiteConfig;
use hrm_probe_cli::{
    launch_browser, load_suite_config, write_sections, Cli, CliConfig, CliResult, ColorChoice,
    Commands, ScenarioGroup, SuiteRunner, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Run(ref args) => {
            let suite = load_suite_config(&cli.suite)?;
            run_group(suite, config, args.group)
        }
        Commands::Tab(ref args) => {
            let suite = load_suite_config(&cli.suite)?;
            let mut runner = SuiteRunner::new(suite, config);
            let plan = runner.plan_tab(args.section, &args.expect)?;
            let report = runner.execute("tab", plan, launch_browser);
            runner.finish(&report)
        }
        Commands::Sections => write_sections(&mut std::io::stdout().lock()),
        Commands::Config => {
            let suite = load_suite_config(&cli.suite)?;
            print!("{}", suite.to_yaml()?);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let color: ColorChoice = cli.color.into();

    let config = CliConfig::new().with_verbosity(verbosity).with_color(color);
    match cli.suite.report {
        Some(ref path) => config.with_report(path),
        None => config,
    }
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color())
        .try_init();
}

fn run_group(suite: SuiteConfig, config: CliConfig, group: ScenarioGroup) -> CliResult<()> {
    let mut runner = SuiteRunner::new(suite, config);
    // Fixture problems surface before any browser starts.
    let plan = runner.plan(group)?;
    let name = match group {
        ScenarioGroup::Login => "login",
        ScenarioGroup::Tabs => "tabs",
    };
    let report = runner.execute(name, plan, launch_browser);
    runner.finish(&report)
}
