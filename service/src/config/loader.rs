//! Configuration loading utilities.
//!
//! This module provides functions for reading, parsing and validating
//! configuration files from disk.

use std::path::Path;

use eyre::WrapErr as _;
use tokio::fs;

use crate::config::{ServiceConfig, resolve_config_relative_path};

/// Reads, parses and validates the service config from a TOML file.
///
/// Relative monitored directories are resolved against the directory of the
/// config file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read, parsed or validated.
pub async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<ServiceConfig> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref).await.wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let mut config: ServiceConfig = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;

    for dir in &mut config.runfolders.monitored_directories {
        *dir = resolve_config_relative_path(path_ref, dir);
    }

    config.runfolders.validate().wrap_err(format!(
        "Invalid [runfolders] section in: {}",
        path_ref.display()
    ))?;
    Ok(config)
}
