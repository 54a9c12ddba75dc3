//! Error types for runfolder discovery and state handling.

use std::{io, path::PathBuf};

use core::time::Duration;

use thiserror::Error as ThisError;

/// Reasons a directory is not (yet) a usable runfolder.
///
/// These are expected during normal operation: a scan simply skips the entry,
/// a direct lookup reports it as not found.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum NotReady {
    #[error("runfolder does not exist: {0}")]
    Missing(PathBuf),
    #[error("descriptor not found in {path} (tried {tried})")]
    NoDescriptor { path: PathBuf, tried: String },
    #[error("completion marker {0} does not exist")]
    MarkerMissing(PathBuf),
    #[error("completion marker {marker} is too young ({age:?} old, grace period {grace:?})")]
    MarkerTooYoung {
        marker: PathBuf,
        age: Duration,
        grace: Duration,
    },
}

/// Errors produced by the runfolder core.
#[derive(Debug, ThisError)]
pub enum RunfolderError {
    /// The directory is absent, has no descriptor, or is not complete yet.
    #[error(transparent)]
    NotReady(#[from] NotReady),
    /// The path does not live directly below a monitored directory.
    #[error("{0} does not belong to a monitored directory")]
    NotMonitored(PathBuf),
    #[error("the state '{0}' is not valid")]
    InvalidState(String),
    #[error("no instrument id found in descriptor of {0}")]
    InstrumentIdMissing(PathBuf),
    #[error("descriptor of {0} carries no run parameters")]
    InvalidMetadata(PathBuf),
    #[error("state file {path} contains unknown token '{token}'")]
    DataCorruption { path: PathBuf, token: String },
    #[error("failed to parse descriptor {path}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RunfolderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the recoverable "not a valid runfolder (yet)" class.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(*self, Self::NotReady(_))
    }
}

pub type Result<T, E = RunfolderError> = core::result::Result<T, E>;
