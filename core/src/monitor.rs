//! The operations offered to the HTTP layer, bound to one configuration.

use std::path::{Component, Path, PathBuf};

use core::time::Duration;

use serde::Deserialize;
use thiserror::Error as ThisError;
use tracing::{error, info, instrument};

use crate::{
    error::{NotReady, Result, RunfolderError},
    runfolder::Runfolder,
    scanner::{in_state, list_runfolders},
    state::State,
};

/// Where to look for runfolders and when to consider them complete.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonitorConfig {
    /// Directories whose immediate children are candidate runfolders.
    pub monitored_directories: Vec<PathBuf>,
    /// Minimum age of the completion marker, in minutes.
    #[serde(default)]
    pub completed_marker_grace_minutes: f64,
}

/// Problems with a [`MonitorConfig`].
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one monitored directory is required")]
    NoMonitoredDirectories,
    #[error("monitored directory path must not be empty")]
    EmptyMonitoredDirectory,
    #[error("completed_marker_grace_minutes must be a non-negative number")]
    InvalidGracePeriod,
}

impl MonitorConfig {
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitored_directories.is_empty() {
            return Err(ConfigError::NoMonitoredDirectories);
        }
        if self
            .monitored_directories
            .iter()
            .any(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyMonitoredDirectory);
        }
        let grace = self.completed_marker_grace_minutes;
        if !grace.is_finite()
            || grace < 0.0
            || Duration::try_from_secs_f64(grace * 60.0).is_err()
        {
            return Err(ConfigError::InvalidGracePeriod);
        }
        Ok(())
    }

    /// The grace period as a duration. Values too large for a [`Duration`]
    /// saturate; negative or NaN values count as zero.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        let secs = self.completed_marker_grace_minutes * 60.0;
        if secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

/// Runfolder discovery and state changes over a set of monitored directories.
///
/// Every call recomputes its answer from the file system.
#[derive(Debug, Clone)]
pub struct RunfolderMonitor {
    roots: Vec<PathBuf>,
    grace: Duration,
}

impl RunfolderMonitor {
    /// # Errors
    ///
    /// Fails if `config` does not validate.
    pub fn new(config: &MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            roots: config.monitored_directories.clone(),
            grace: config.grace_period(),
        })
    }

    #[must_use]
    pub fn monitored_directories(&self) -> &[PathBuf] {
        &self.roots
    }

    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        self.grace
    }

    /// All runfolders, or only those in `state`.
    ///
    /// # Errors
    ///
    /// See [`list_runfolders`].
    pub fn list(&self, state: Option<State>) -> Result<Vec<Runfolder>> {
        match state {
            Some(state) => list_runfolders(&self.roots, self.grace, in_state(state)),
            None => list_runfolders(&self.roots, self.grace, |_| true),
        }
    }

    /// Like [`RunfolderMonitor::list`], paired with the state read for each
    /// runfolder.
    ///
    /// A runfolder whose state file holds an unknown token is logged and left
    /// out; the rest of the listing is unaffected.
    ///
    /// # Errors
    ///
    /// See [`list_runfolders`], plus failures reading a state file.
    pub fn list_with_state(&self, state: Option<State>) -> Result<Vec<(Runfolder, State)>> {
        let mut listed = Vec::new();
        for runfolder in list_runfolders(&self.roots, self.grace, |_| true)? {
            let current = match runfolder.state() {
                Ok(current) => current,
                Err(e @ RunfolderError::DataCorruption { .. }) => {
                    error!(runfolder = ?runfolder.path(), error = %e, "failed to read runfolder state");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if state.is_none_or(|wanted| wanted == current) {
                listed.push((runfolder, current));
            }
        }
        Ok(listed)
    }

    /// The first runfolder found in [`State::Ready`].
    ///
    /// # Errors
    ///
    /// See [`list_runfolders`].
    pub fn next_ready(&self) -> Result<Option<Runfolder>> {
        Ok(self.list(Some(State::Ready))?.into_iter().next())
    }

    /// Claims the first ready runfolder by moving it to [`State::Pending`].
    ///
    /// The check and the write are not atomic: two concurrent callers may
    /// both claim the same runfolder.
    ///
    /// # Errors
    ///
    /// See [`list_runfolders`], plus failures writing the state file.
    #[instrument(skip(self))]
    pub fn pickup(&self) -> Result<Option<Runfolder>> {
        let Some(runfolder) = self.next_ready()? else {
            return Ok(None);
        };
        runfolder.set_state(State::Pending)?;
        info!(runfolder = ?runfolder.path(), "picked up runfolder");
        Ok(Some(runfolder))
    }

    /// Opens the runfolder at `path`, which must be an immediate child of a
    /// monitored directory.
    ///
    /// # Errors
    ///
    /// [`RunfolderError::NotMonitored`] for paths outside the monitored
    /// directories, otherwise as [`Runfolder::open`].
    pub fn lookup(&self, path: &Path) -> Result<Runfolder> {
        if !self.is_monitored(path) {
            return Err(RunfolderError::NotMonitored(path.to_path_buf()));
        }
        Runfolder::open(path, self.grace)
    }

    /// Opens the first runfolder called `name` in any monitored directory.
    ///
    /// # Errors
    ///
    /// A not-found error if no monitored directory holds a valid runfolder
    /// of that name; hard errors are returned as soon as they occur.
    pub fn lookup_by_name(&self, name: &str) -> Result<Runfolder> {
        let is_plain_name = Path::new(name).file_name().is_some_and(|n| n == name);
        if is_plain_name {
            for root in &self.roots {
                match Runfolder::open(&root.join(name), self.grace) {
                    Ok(runfolder) => return Ok(runfolder),
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Err(NotReady::Missing(PathBuf::from(name)).into())
    }

    /// Sets the state of the runfolder at `path` from a state token.
    ///
    /// # Errors
    ///
    /// As [`RunfolderMonitor::lookup`] and [`Runfolder::set_state_token`].
    pub fn set_state(&self, path: &Path, token: &str) -> Result<State> {
        self.lookup(path)?.set_state_token(token)
    }

    /// Whether `path` names an entry directly below a monitored directory.
    /// `<root>/..` does not.
    #[must_use]
    pub fn is_monitored(&self, path: &Path) -> bool {
        matches!(path.components().next_back(), Some(Component::Normal(_)))
            && path
                .parent()
                .is_some_and(|parent| self.roots.iter().any(|root| root == parent))
    }
}
