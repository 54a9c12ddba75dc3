//! A runfolder on disk: validity gate, persisted state and derived metadata.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write as _},
    path::{Path, PathBuf},
    time::SystemTime,
};

use core::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    descriptor::{RunDescriptor, lookup, text_of},
    error::{NotReady, Result, RunfolderError},
    instrument::Instrument,
    state::State,
};

/// Hidden per-runfolder directory holding the sidecar files.
pub const METADATA_DIR: &str = ".arteria";
/// Sidecar file holding the state token, inside [`METADATA_DIR`].
pub const STATE_FILE: &str = "state";

const SAMPLE_TUBE: &str = "SampleTube";

/// Outcome of inspecting one candidate directory.
#[derive(Debug)]
pub enum Candidate {
    Ready(Runfolder),
    NotReady(NotReady),
}

/// A completed runfolder. Constructing one is the validity check.
///
/// Nothing but the descriptor is cached: the state is read from the sidecar
/// file on every access, so any number of processes sharing the storage see
/// the same value. Writes are plain whole-file overwrites without locking; two
/// concurrent read-then-write sequences can both succeed.
#[derive(Debug, Clone)]
pub struct Runfolder {
    path: PathBuf,
    descriptor: RunDescriptor,
    instrument: Instrument,
    state_file: PathBuf,
}

/// Best-effort metadata extracted from the descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reagent_kit_barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_tube_barcode: Option<String>,
}

impl Runfolder {
    /// Inspects `path`, telling apart "not a runfolder yet" from hard failures.
    ///
    /// On success the sidecar directory is created and a missing state file
    /// is initialised to [`State::Ready`].
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed descriptors, descriptors without an
    /// instrument id, and I/O errors other than a missing marker.
    pub fn probe(path: &Path, grace: Duration) -> Result<Candidate> {
        if !path.is_dir() {
            return Ok(Candidate::NotReady(NotReady::Missing(path.to_path_buf())));
        }

        let descriptor_path = match RunDescriptor::locate(path) {
            Ok(found) => found,
            Err(reason) => return Ok(Candidate::NotReady(reason)),
        };
        let descriptor = RunDescriptor::from_file(&descriptor_path)?;
        let instrument = Instrument::classify(&descriptor, path)?;

        let marker = path.join(instrument.completion_marker);
        let modified = match fs::metadata(&marker).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Candidate::NotReady(NotReady::MarkerMissing(marker)));
            }
            Err(e) => return Err(RunfolderError::io(marker, e)),
        };
        // a marker stamped in the future counts as brand new
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age <= grace {
            return Ok(Candidate::NotReady(NotReady::MarkerTooYoung {
                marker,
                age,
                grace,
            }));
        }

        let state_file = init_state_file(path)?;

        Ok(Candidate::Ready(Self {
            path: path.to_path_buf(),
            descriptor,
            instrument,
            state_file,
        }))
    }

    /// Opens the runfolder at `path`.
    ///
    /// # Errors
    ///
    /// [`RunfolderError::NotReady`] when the directory is not a completed
    /// runfolder, otherwise as [`Runfolder::probe`].
    pub fn open(path: &Path, grace: Duration) -> Result<Self> {
        match Self::probe(path, grace)? {
            Candidate::Ready(runfolder) => Ok(runfolder),
            Candidate::NotReady(reason) => Err(reason.into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory name of the runfolder.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    #[must_use]
    pub const fn descriptor(&self) -> &RunDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub const fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// Current state, read from the sidecar file.
    ///
    /// # Errors
    ///
    /// [`RunfolderError::DataCorruption`] if the file holds an unknown token,
    /// [`RunfolderError::Io`] if it cannot be read.
    pub fn state(&self) -> Result<State> {
        let content = fs::read_to_string(&self.state_file)
            .map_err(|e| RunfolderError::io(&self.state_file, e))?;
        content
            .parse::<State>()
            .map_err(|_| RunfolderError::DataCorruption {
                path: self.state_file.clone(),
                token: content.trim().to_string(),
            })
    }

    /// Overwrites the persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`RunfolderError::Io`] if the sidecar file cannot be written.
    pub fn set_state(&self, state: State) -> Result<()> {
        fs::write(&self.state_file, state.as_str())
            .map_err(|e| RunfolderError::io(&self.state_file, e))?;
        info!(runfolder = ?self.path, %state, "set runfolder state");
        Ok(())
    }

    /// Parses `token` and persists it. Unknown tokens leave the file untouched.
    ///
    /// # Errors
    ///
    /// [`RunfolderError::InvalidState`] for unknown tokens, otherwise as
    /// [`Runfolder::set_state`].
    pub fn set_state_token(&self, token: &str) -> Result<State> {
        let state = token.parse()?;
        self.set_state(state)?;
        Ok(state)
    }

    /// Barcodes found in the descriptor. Missing fields are left out.
    #[must_use]
    pub fn metadata(&self) -> RunMetadata {
        let reagent_kit_barcode = self
            .descriptor
            .text(&["ReagentKitBarcode"])
            .map(str::to_string);
        if reagent_kit_barcode.is_none() {
            debug!(runfolder = ?self.path, "Reagent kit barcode not found");
        }

        let library_tube_barcode = self
            .descriptor
            .text(&["RfidsInfo", "LibraryTubeSerialBarcode"])
            .or_else(|| {
                self.descriptor
                    .items(&["ConsumableInfo", "ConsumableInfo"])
                    .find(|&consumable| {
                        lookup(consumable, &["Type"]).and_then(text_of) == Some(SAMPLE_TUBE)
                    })
                    .and_then(|consumable| lookup(consumable, &["SerialNumber"]))
                    .and_then(text_of)
            })
            .map(str::to_string);
        if library_tube_barcode.is_none() {
            debug!(runfolder = ?self.path, "Library tube barcode not found");
        }

        RunMetadata {
            reagent_kit_barcode,
            library_tube_barcode,
        }
    }
}

/// Creates the sidecar directory and a `ready` state file if absent.
fn init_state_file(runfolder: &Path) -> Result<PathBuf> {
    let dir = runfolder.join(METADATA_DIR);
    fs::create_dir_all(&dir).map_err(|e| RunfolderError::io(&dir, e))?;

    let state_file = dir.join(STATE_FILE);
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&state_file)
    {
        Ok(mut file) => {
            file.write_all(State::Ready.as_str().as_bytes())
                .map_err(|e| RunfolderError::io(&state_file, e))?;
            info!(runfolder = ?runfolder, "discovered new runfolder");
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(RunfolderError::io(&state_file, e)),
    }
    Ok(state_file)
}
