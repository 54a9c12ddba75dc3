//! Enumeration of runfolders below the monitored directories.

use std::{fs, path::Path};

use core::time::Duration;

use tracing::{debug, error};

use crate::{
    error::{Result, RunfolderError},
    runfolder::{Candidate, Runfolder},
    state::State,
};

/// Lists the valid runfolders directly below each of `roots` that satisfy
/// `predicate`.
///
/// Entries that are not (yet) runfolders are skipped. Results come root by
/// root, each in the order the directory listing yields them; no sorting is
/// applied.
///
/// # Errors
///
/// Fails if a root cannot be listed or an entry fails with anything other than
/// a "not ready" condition, e.g. a malformed descriptor.
pub fn list_runfolders<P, F>(roots: &[P], grace: Duration, mut predicate: F) -> Result<Vec<Runfolder>>
where
    P: AsRef<Path>,
    F: FnMut(&Runfolder) -> bool,
{
    let mut runfolders = Vec::new();
    for root in roots {
        let root = root.as_ref();
        let entries = fs::read_dir(root).map_err(|e| RunfolderError::io(root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| RunfolderError::io(root, e))?;
            match Runfolder::probe(&entry.path(), grace)? {
                Candidate::Ready(runfolder) => {
                    if predicate(&runfolder) {
                        runfolders.push(runfolder);
                    }
                }
                Candidate::NotReady(reason) => {
                    debug!(%reason, "skipping entry");
                }
            }
        }
    }
    Ok(runfolders)
}

/// Predicate accepting runfolders currently in `state`.
///
/// A runfolder whose state cannot be read is logged and excluded, so one
/// corrupt sidecar file does not hide every other runfolder.
pub fn in_state(state: State) -> impl FnMut(&Runfolder) -> bool {
    move |runfolder| match runfolder.state() {
        Ok(current) => current == state,
        Err(e) => {
            error!(runfolder = ?runfolder.path(), error = %e, "failed to read runfolder state");
            false
        }
    }
}
