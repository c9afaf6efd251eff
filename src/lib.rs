//! apim-migrate - A CLI tool and library for migrating API Manager
//! applications between environments.
//!
//! This crate provides functionality to:
//! - Register a dynamic OAuth client and obtain an access token for one run
//! - Export all applications from a source environment into zip archives
//! - Import archives into a target environment, remapping each archived
//!   key manager's OAuth keys for the PRODUCTION and SANDBOX stages
//! - Revoke the access token at the end of the run
//!
//! # Example
//!
//! ```no_run
//! use apim_migrate::{Config, RunMode, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let mode = RunMode { export: true, import: false };
//!
//!     let summary = run(&config, mode).await?;
//!     println!("{summary}");
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod import;
pub mod logging;
pub mod run;
pub mod throttle;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{MigrateError, Result};
pub use run::{RunMode, RunSummary, run};
