//! Instrument classification: which completion marker a runfolder waits for.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

use crate::{
    descriptor::RunDescriptor,
    error::{Result, RunfolderError},
};

/// Marker used when the instrument id matches no known instrument.
pub const DEFAULT_COMPLETION_MARKER: &str = "RTAComplete.txt";

/// Instrument id fields, checked after `Setup/ScannerID`.
const INSTRUMENT_ID_KEYS: [&str; 4] = [
    "InstrumentName",
    "InstrumentId",
    "ScannerID",
    "InstrumentSerialNumber",
];

/// `(id pattern, label, completion marker)`, evaluated first match wins.
const INSTRUMENT_TABLE: [(&str, &str, &str); 6] = [
    ("^A", "NovaSeq", "CopyComplete.txt"),
    ("^LH", "NovaSeqXPlus", "CopyComplete.txt"),
    ("^FS", "iSeq", "CopyComplete.txt"),
    ("^M", "MiSeq", "RTAComplete.txt"),
    ("^D", "HiSeq", "RTAComplete.txt"),
    ("^ST-E", "HiSeqX", "RTAComplete.txt"),
];

static COMPILED_TABLE: LazyLock<Vec<(Regex, &'static str, &'static str)>> = LazyLock::new(|| {
    INSTRUMENT_TABLE
        .iter()
        .map(|&(pattern, label, marker)| {
            let regex = Regex::new(pattern).expect("instrument pattern must compile");
            (regex, label, marker)
        })
        .collect()
});

/// Result of classifying a runfolder's instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    /// Instrument family, `None` for unrecognised ids.
    pub label: Option<&'static str>,
    /// File name whose presence marks the run as completely written.
    pub completion_marker: &'static str,
}

impl Instrument {
    /// Classifies an instrument id against the instrument table.
    #[must_use]
    pub fn from_id(instrument_id: &str) -> Self {
        COMPILED_TABLE
            .iter()
            .find(|&&(ref regex, _, _)| regex.is_match(instrument_id))
            .map_or(
                Self {
                    label: None,
                    completion_marker: DEFAULT_COMPLETION_MARKER,
                },
                |&(_, label, marker)| Self {
                    label: Some(label),
                    completion_marker: marker,
                },
            )
    }

    /// Classifies the instrument that wrote `descriptor`. `runfolder` is only
    /// used for error reporting.
    ///
    /// # Errors
    ///
    /// [`RunfolderError::InvalidMetadata`] for an empty descriptor and
    /// [`RunfolderError::InstrumentIdMissing`] when no id field is present.
    pub fn classify(descriptor: &RunDescriptor, runfolder: &Path) -> Result<Self> {
        if descriptor.is_empty() {
            return Err(RunfolderError::InvalidMetadata(runfolder.to_path_buf()));
        }
        let id = instrument_id(descriptor)
            .ok_or_else(|| RunfolderError::InstrumentIdMissing(runfolder.to_path_buf()))?;
        let instrument = Self::from_id(id);
        tracing::trace!(id, label = ?instrument.label, marker = instrument.completion_marker, "classified instrument");
        Ok(instrument)
    }
}

/// Instrument id of the descriptor, if any id field is present.
#[must_use]
pub fn instrument_id(descriptor: &RunDescriptor) -> Option<&str> {
    descriptor.text(&["Setup", "ScannerID"]).or_else(|| {
        INSTRUMENT_ID_KEYS
            .iter()
            .find_map(|&key| descriptor.text(&[key]))
    })
}
