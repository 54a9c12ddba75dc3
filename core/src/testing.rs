//! Fixtures shared by the unit tests.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use core::time::Duration;

use filetime::{FileTime, set_file_mtime};
use tempfile::TempDir;

pub(crate) const HOUR: Duration = Duration::from_secs(60 * 60);

pub(crate) const NOVASEQ_XML: &str = r#"<?xml version="1.0"?>
<RunParameters xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Side>A</Side>
  <ReagentKitBarcode>RK0001</ReagentKitBarcode>
  <RfidsInfo>
    <LibraryTubeSerialBarcode>NV0012345-LIB</LibraryTubeSerialBarcode>
  </RfidsInfo>
  <InstrumentName>A00834</InstrumentName>
</RunParameters>"#;

pub(crate) const MISEQ_XML: &str = r"<RunParameters>
  <Setup><ScannerID>M04499</ScannerID></Setup>
</RunParameters>";

/// Temporary monitored directory, removed on drop.
pub(crate) struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Writes a runfolder with the given descriptor and a completion marker
/// last modified `age` ago.
pub(crate) fn write_runfolder(
    root: &Path,
    name: &str,
    descriptor_xml: &str,
    marker: &str,
    age: Duration,
) -> PathBuf {
    let path = root.join(name);
    fs::create_dir_all(&path).expect("failed to create runfolder");
    fs::write(path.join("RunParameters.xml"), descriptor_xml).expect("failed to write descriptor");
    let marker = path.join(marker);
    fs::write(&marker, "").expect("failed to write marker");
    age_file(&marker, age);
    path
}

/// Sets the modification time of `path` to `age` ago.
pub(crate) fn age_file(path: &Path, age: Duration) {
    let mtime = SystemTime::now()
        .checked_sub(age)
        .expect("age before the epoch");
    set_file_mtime(path, FileTime::from_system_time(mtime)).expect("failed to set mtime");
}
