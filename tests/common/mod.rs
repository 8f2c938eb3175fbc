#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Building-energy style dataset with long text values that collide after
/// truncation, a zero permutation row and a `name` column.
pub const ENERGY_CSV: &str = "\
Permutation #,name,Wall Type,EUI (Total) (kWh/m2)
0,Baseline,Insulated concrete masonry wall,150.5
1,Option A,Insulated concrete masonry wall,120
2,Option B,Insulated concrete masonry block,95.5
3,Option C,Timber frame,80
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn energy_csv(&self) -> PathBuf {
        self.write("energy.csv", ENERGY_CSV)
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("read workspace file")
    }
}
