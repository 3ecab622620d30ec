//! Arguments shared by the `platform-compat` subcommands

use clap::Parser;
use std::path::PathBuf;

use super::OutputFormat;

/// Output options of commands that print a report.
#[derive(Parser, Debug, Clone)]
pub struct OutputArgs {
    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress the summary header
    #[arg(short, long)]
    pub quiet: bool,
}

/// Location of the analyzer configuration file.
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to a .toml, .yaml or .json configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
