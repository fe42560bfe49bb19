use std::io;

use thiserror::Error;

/// Failures surfaced by ingestion, the summarizer inputs and the dataset store.
///
/// File deletions during eviction or a full clear never produce one of these;
/// they are logged and skipped.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The uploaded bytes are not valid delimited text.
    #[error("could not parse CSV: {0}")]
    Parse(String),
    /// Writing the raw upload to storage failed. No dataset was created.
    #[error("could not store uploaded file: {0}")]
    StorageWrite(#[source] io::Error),
    /// The backing file of a dataset is missing or unreadable.
    #[error("could not read dataset file: {0}")]
    StorageRead(#[source] io::Error),
    /// No dataset with this identifier exists (never created, evicted or cleared).
    #[error("dataset {0} not found")]
    NotFound(u64),
    /// The dataset manifest could not be loaded or written.
    #[error("dataset manifest error: {0}")]
    Manifest(String),
}

impl DatasetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::NotFound(_))
    }
}

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;
