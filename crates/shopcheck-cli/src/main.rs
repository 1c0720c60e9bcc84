//! shopcheck: end-to-end checks for a live storefront home page
//!
//! ## Usage
//!
//! ```bash
//! shopcheck run                          # Run TC01..TC05 headless
//! shopcheck run --filter menu --headed   # Watch the menu scenarios
//! shopcheck run --suite suites/storefront.yaml --html
//! shopcheck list --json                  # Scenario ids, titles and steps
//! shopcheck viewports                    # Device presets
//! ```

use clap::Parser;
use shopcheck_cli::{
    init_tracing, list_text, viewports_text, CheckRunner, Cli, CliConfig, CliError, CliResult,
    Commands, RunArgs, Verbosity,
};
use std::process::ExitCode;

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
    init_tracing(config.verbosity);

    match cli.command {
        Commands::Run(args) => run_suite(config, &args),
        Commands::List(args) => {
            print!("{}", list_text(&args)?);
            Ok(())
        }
        Commands::Viewports(args) => {
            print!("{}", viewports_text(&args)?);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
}

fn run_suite(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;

    let mut runner = CheckRunner::new(config);
    rt.block_on(async { runner.run(args).await })?;
    Ok(())
}
