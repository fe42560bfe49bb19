//! Persistent dataset records with size-bounded retention.
//!
//! A [`DatasetStore`] owns the raw upload bytes (through a [`FileStorage`])
//! and the dataset records. Records are kept in upload order and, on disk,
//! in a JSON manifest next to the uploads:
//!
//! ```text
//! <root>/manifest.json        next id + every live dataset record
//! <root>/datasets/<uuid>.csv  raw upload bytes
//! ```
//!
//! Every [`DatasetStore::save`] inserts the new record and then evicts all but
//! the `retention` most recent datasets. Insert and eviction run under one
//! lock, so concurrent saves through the same store never leave more than
//! `retention` records behind.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DatasetError, DatasetResult},
    storage::{FileHandle, FileStorage, FsStorage},
    summary::Summary,
};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: u64,
    pub uploaded_at: DateTime<Utc>,
    pub file: FileHandle,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default)]
    datasets: Vec<Dataset>,
}

fn first_id() -> u64 {
    1
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            datasets: Vec::new(),
        }
    }
}

impl Manifest {
    fn load(path: &Path) -> DatasetResult<Self> {
        let file = File::open(path)
            .map_err(|err| DatasetError::Manifest(format!("Opening {path:?}: {err}")))?;
        let mut manifest: Manifest = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| DatasetError::Manifest(format!("Parsing {path:?}: {err}")))?;
        manifest.sort();
        if let Some(max_id) = manifest.datasets.iter().map(|d| d.id).max() {
            manifest.next_id = manifest.next_id.max(max_id + 1);
        }
        Ok(manifest)
    }

    fn save(&self, path: &Path) -> DatasetResult<()> {
        let tmp = path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
            drop(writer);
            fs::rename(&tmp, path)
        };
        write().map_err(|err| {
            let _ = fs::remove_file(&tmp);
            DatasetError::Manifest(format!("Writing {path:?}: {err}"))
        })
    }

    /// Oldest first: by upload time, then by id.
    fn sort(&mut self) {
        self.datasets
            .sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
    }
}

pub struct DatasetStore {
    storage: Box<dyn FileStorage>,
    manifest_path: Option<PathBuf>,
    retention: usize,
    state: Mutex<Manifest>,
}

impl DatasetStore {
    /// Opens (or creates) a filesystem-backed store rooted at `root`.
    pub fn open(root: &Path, retention: usize) -> DatasetResult<Self> {
        fs::create_dir_all(root).map_err(DatasetError::StorageWrite)?;
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            Manifest::load(&manifest_path)?
        } else {
            Manifest::default()
        };
        debug!(
            "Opened dataset store at {root:?} with {} dataset(s)",
            manifest.datasets.len()
        );
        Ok(Self {
            storage: Box::new(FsStorage::new(root)),
            manifest_path: Some(manifest_path),
            retention: retention.max(1),
            state: Mutex::new(manifest),
        })
    }

    /// Store whose records live in memory only; uploads go to `storage`.
    pub fn with_storage(storage: impl FileStorage + 'static, retention: usize) -> Self {
        Self {
            storage: Box::new(storage),
            manifest_path: None,
            retention: retention.max(1),
            state: Mutex::new(Manifest::default()),
        }
    }

    /// Persists `raw` and a new dataset record, then evicts beyond the retention count.
    ///
    /// Either the upload bytes and the record are both stored or neither is.
    pub fn save(&self, raw: &[u8], summary: Summary) -> DatasetResult<Dataset> {
        let mut state = self.state.lock();
        let file = self.storage.put(raw).map_err(DatasetError::StorageWrite)?;

        let now = Utc::now().trunc_subsecs(6);
        let uploaded_at = state
            .datasets
            .last()
            .map_or(now, |latest| latest.uploaded_at.max(now));
        let dataset = Dataset {
            id: state.next_id,
            uploaded_at,
            file,
            summary,
        };

        let mut next = state.clone();
        next.next_id += 1;
        next.datasets.push(dataset.clone());
        let evicted = evict(&mut next, self.retention);

        if let Err(err) = self.persist(&next) {
            if let Err(cleanup) = self.storage.delete(&dataset.file) {
                warn!(
                    "Failed to remove {} after aborted save: {cleanup}",
                    dataset.file
                );
            }
            return Err(err);
        }
        *state = next;
        drop(state);

        info!(
            "Saved dataset {} ({} row(s)) as {}",
            dataset.id, dataset.summary.total_count, dataset.file
        );
        for old in &evicted {
            info!("Evicted dataset {} uploaded at {}", old.id, old.uploaded_at);
            self.release(&old.file);
        }
        Ok(dataset)
    }

    /// Most recent datasets first, at most `limit` of them.
    pub fn list(&self, limit: usize) -> Vec<Dataset> {
        let state = self.state.lock();
        state.datasets.iter().rev().take(limit).cloned().collect()
    }

    pub fn get(&self, id: u64) -> DatasetResult<Dataset> {
        self.state
            .lock()
            .datasets
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(DatasetError::NotFound(id))
    }

    /// Raw bytes of a dataset's stored upload.
    pub fn read_file(&self, id: u64) -> DatasetResult<Vec<u8>> {
        let dataset = self.get(id)?;
        self.storage
            .read(&dataset.file)
            .map_err(DatasetError::StorageRead)
    }

    /// Removes every dataset and its upload. Safe to call on an empty store.
    pub fn delete_all(&self) -> DatasetResult<usize> {
        let mut state = self.state.lock();
        if state.datasets.is_empty() {
            return Ok(0);
        }
        let mut next = state.clone();
        let removed = std::mem::take(&mut next.datasets);
        self.persist(&next)?;
        *state = next;
        drop(state);

        for dataset in &removed {
            self.release(&dataset.file);
        }
        info!("Deleted {} dataset(s)", removed.len());
        Ok(removed.len())
    }

    pub fn len(&self) -> usize {
        self.state.lock().datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, manifest: &Manifest) -> DatasetResult<()> {
        match &self.manifest_path {
            Some(path) => manifest.save(path),
            None => Ok(()),
        }
    }

    fn release(&self, file: &FileHandle) {
        if let Err(err) = self.storage.delete(file) {
            warn!("Could not delete stored file {file}: {err}");
        }
    }
}

/// Drops all but the `retention` newest datasets and returns the dropped ones.
fn evict(manifest: &mut Manifest, retention: usize) -> Vec<Dataset> {
    manifest.sort();
    let excess = manifest.datasets.len().saturating_sub(retention);
    manifest.datasets.drain(..excess).collect()
}
