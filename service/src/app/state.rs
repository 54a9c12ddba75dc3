use alloc::sync::Arc;
use std::path::{Path, PathBuf};

use arteria_core::RunfolderMonitor;
use eyre::WrapErr as _;
use tracing::{info, warn};

use crate::config::{ServerConfig, ServiceConfig};

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Path to the configuration file the service was started with.
    pub config_path: PathBuf,

    /// Runfolder discovery over the configured monitored directories.
    pub monitor: Arc<RunfolderMonitor>,

    /// Name of this machine, used in links when a request carries no `Host`.
    pub hostname: Arc<str>,
}

impl AppState {
    /// Builds the state from an already loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the runfolder configuration is invalid.
    pub fn from_config(config: &ServiceConfig, config_path: &Path) -> eyre::Result<Self> {
        let monitor = RunfolderMonitor::new(&config.runfolders)
            .wrap_err("Failed to set up runfolder monitoring")?;
        Ok(Self {
            config_path: config_path.to_path_buf(),
            monitor: Arc::new(monitor),
            hostname: local_hostname().into(),
        })
    }
}

fn local_hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!("Failed to determine hostname: {e}");
            "localhost".to_string()
        }
    }
}

/// Emit startup warnings based on configuration.
fn emit_startup_warnings(app_state: &AppState) {
    for dir in app_state.monitor.monitored_directories() {
        if !dir.is_dir() {
            warn!(
                "Monitored directory {} does not exist (yet); runfolder queries will fail until it does",
                dir.display()
            );
        }
    }
}

/// Initialize application state from an already loaded configuration.
#[tracing::instrument(skip_all)]
pub(super) fn initialize_state(
    config: &ServiceConfig,
    config_path: &Path,
) -> eyre::Result<(AppState, ServerConfig)> {
    let app_state = AppState::from_config(config, config_path)?;

    info!(
        config_path = %app_state.config_path.display(),
        monitored_directories = ?app_state.monitor.monitored_directories(),
        grace_period = ?app_state.monitor.grace_period(),
        "Runfolder monitoring configured"
    );

    emit_startup_warnings(&app_state);

    Ok((app_state, config.server.clone()))
}
