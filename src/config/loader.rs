//! Configuration file loading and validation.

use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};

use super::types::Config;

/// File name the tool looks for when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "environment.toml";

impl Config {
    /// Get the list of config file search paths in priority order.
    fn get_config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. ./environment.toml (current directory - matches the original tool)
        paths.push(PathBuf::from(CONFIG_FILE_NAME));

        // 2. ~/.config/apim-migrate/environment.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config/apim-migrate").join(CONFIG_FILE_NAME));
        }

        // 3. Platform-native config directory
        if let Some(config_dir) = dirs::config_dir() {
            let native = config_dir.join("apim-migrate").join(CONFIG_FILE_NAME);
            if !paths.contains(&native) {
                paths.push(native);
            }
        }

        paths
    }

    /// Load the configuration, either from an explicit path or by searching
    /// the standard locations. Fails fast on a missing file, unparseable
    /// TOML, or missing/empty required fields — before any network call.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => Self::get_config_search_paths()
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| {
                    MigrateError::config(format!(
                        "no {CONFIG_FILE_NAME} found; searched the current directory and the config directory"
                    ))
                })?,
        };

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            MigrateError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&raw)
            .map_err(|e| MigrateError::config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(raw: &str) -> std::result::Result<Config, String> {
        let config: Config = toml::from_str(raw).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.apim.hostname.trim().is_empty() {
            return Err("apim.hostname must not be empty".to_string());
        }
        if self.username.is_empty() {
            return Err("username must not be empty".to_string());
        }
        if self.password.is_empty() {
            return Err("password must not be empty".to_string());
        }
        Ok(())
    }
}
