//! shopcheck CLI library
//!
//! Argument parsing, terminal output and the glue between the command line
//! and [`shopcheck::SuiteRunner`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ListArgs, RunArgs, ViewportsArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_tracing;
pub use output::ProgressReporter;
pub use runner::{list_text, load_suite, resolve_config, viewports_text, CheckRunner};
