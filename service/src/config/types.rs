//! Configuration data types for the runfolder service.

use std::path::{Component, Path, PathBuf};

use arteria_core::MonitorConfig;
use serde::Deserialize;

/// Root config structure: server binding, runfolder monitoring and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Monitored directories and the completion marker grace period.
    pub runfolders: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server binding configuration section.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port of the HTTP API.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

/// Log filter configuration. `RUST_LOG` takes precedence when set.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,arteria_core=debug`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

const fn default_port() -> u16 {
    10800
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_filter() -> String {
    "info".to_string()
}

/// Resolves a path to an absolute one.
///
/// If the path is absolute, returns it as-is. If relative, joins it with the
/// config file's parent directory and normalizes the result to remove redundant
/// components like `./`.
pub fn resolve_config_relative_path(config_path: &Path, relative_path: &Path) -> PathBuf {
    let resolved = if relative_path.is_absolute() {
        relative_path.to_path_buf()
    } else {
        config_path
            .parent()
            .map_or_else(|| relative_path.to_path_buf(), |d| d.join(relative_path))
    };

    // We can't use canonicalize() because the directory might not be mounted yet
    normalize_path(&resolved)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        use Component as C;
        match component {
            C::Normal(c) => {
                result.push(c);
            }
            C::ParentDir => {
                result.pop();
            }
            C::CurDir => {}
            C::RootDir | C::Prefix(_) => {
                result.push(component);
            }
        }
    }
    result
}
