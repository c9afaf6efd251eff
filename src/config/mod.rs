//! Configuration loading and management.

mod loader;
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use types::{
    ApimConfig, Config, DcrConfig, ExportConfig, HttpConfig, ImportConfig, LogConfig,
};
