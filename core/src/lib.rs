//! Runfolder discovery and state tracking.
//!
//! Sequencing instruments write runfolders onto shared storage. This crate
//! decides whether a directory is a completed, recognisable run and keeps its
//! processing state in a sidecar file inside the runfolder:
//! - [`instrument`]: instrument id → completion marker
//! - [`descriptor`]: the parsed `RunParameters.xml`
//! - [`runfolder`]: the validity gate, state accessors and metadata
//! - [`scanner`]: tolerant enumeration of the monitored directories
//! - [`monitor`]: the above bound to one configuration
#![cfg_attr(
    test,
    expect(clippy::unwrap_used, reason = "This is not problematic in tests",)
)]

pub mod descriptor;
pub mod error;
pub mod instrument;
pub mod monitor;
pub mod runfolder;
pub mod scanner;
pub mod state;

#[cfg(test)]
mod testing;

pub use descriptor::RunDescriptor;
pub use error::{NotReady, RunfolderError};
pub use instrument::Instrument;
pub use monitor::{ConfigError, MonitorConfig, RunfolderMonitor};
pub use runfolder::{Candidate, RunMetadata, Runfolder};
pub use scanner::list_runfolders;
pub use state::State;
