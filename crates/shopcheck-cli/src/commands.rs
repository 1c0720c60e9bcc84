//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// shopcheck: end-to-end checks for a live storefront home page
#[derive(Parser, Debug)]
#[command(name = "shopcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenario suite against the storefront
    Run(RunArgs),

    /// List scenarios without running them
    List(ListArgs),

    /// Print the viewport preset table
    Viewports(ViewportsArgs),
}

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Config file (defaults to ./shopcheck.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scenario suite in YAML (defaults to the built-in storefront suite)
    #[arg(short, long)]
    pub suite: Option<PathBuf>,

    /// Storefront URL, overrides config and SHOPCHECK_BASE_URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Only run scenarios whose id or title contains TEXT
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Report output directory
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable Chromium's sandbox (containers, CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Stop at the first scenario that does not pass
    #[arg(long)]
    pub fail_fast: bool,

    /// Replace the previous report instead of numbering a new one
    #[arg(long)]
    pub overwrite: bool,

    /// Also write an HTML report
    #[arg(long)]
    pub html: bool,
}

/// Arguments for the list command
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Scenario suite in YAML (defaults to the built-in storefront suite)
    #[arg(short, long)]
    pub suite: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the viewports command
#[derive(Args, Debug, Default)]
pub struct ViewportsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
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
