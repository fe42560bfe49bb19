#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use equipment_datasets::{
    config::Settings, service::IngestService, store::DatasetStore,
};

pub const EQUIPMENT_CSV: &str = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-1,Pump,120.5,5.2,110
Compressor-1,Compressor,95,8.4,95.5
Valve-1,Valve,60,4.1,105
Pump-2,Pump,132,5.6,
HeatExchanger-1,HeatExchanger,150,6.2,130
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

    /// Directory used as the dataset store root.
    pub fn store_root(&self) -> PathBuf {
        self.temp_dir.path().join("media")
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Opens a service over this workspace's store with default settings.
    pub fn service(&self) -> IngestService {
        let settings = Settings::default();
        let store =
            DatasetStore::open(&self.store_root(), settings.retention).expect("open store");
        IngestService::new(store, settings).expect("service")
    }
}

/// A numeric-only upload with a single `Flowrate` column and a marker value.
pub fn flowrate_csv(marker: usize) -> String {
    format!("Type,Flowrate\nPump,{marker}\nValve,{}\n", marker + 1)
}
