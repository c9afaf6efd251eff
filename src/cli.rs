//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

/// Main CLI structure for apim-migrate.
#[derive(Parser, Debug)]
#[command(name = "apim-migrate")]
#[command(about = "Migrate API Manager applications between environments", long_about = None)]
pub struct Cli {
    /// Export all applications from the source environment
    #[arg(long = "export-apps")]
    pub export_apps: bool,

    /// Import previously exported application archives into the target environment
    #[arg(long = "import-apps")]
    pub import_apps: bool,

    /// Path to the environment.toml configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
