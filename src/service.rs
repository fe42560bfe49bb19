//! Operations consumed by the outer request layer.
//!
//! An [`IngestService`] ties the CSV parser, the summarizer and a
//! [`DatasetStore`] together behind the handful of calls a front end needs.

use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    config::Settings,
    data::{Row, parse_table},
    error::{DatasetError, DatasetResult},
    io_utils, report,
    store::{Dataset, DatasetStore},
    summary::summarize,
};

pub struct IngestService {
    store: DatasetStore,
    settings: Settings,
    encoding: &'static Encoding,
}

impl IngestService {
    pub fn new(store: DatasetStore, settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let encoding = io_utils::resolve_encoding(settings.input_encoding.as_deref())?;
        Ok(Self {
            store,
            settings,
            encoding,
        })
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Parses, summarizes and stores an upload.
    ///
    /// Nothing is persisted when parsing or the file write fails.
    pub fn ingest(&self, bytes: &[u8]) -> DatasetResult<Dataset> {
        let table = parse_table(bytes, self.encoding)?;
        debug!(
            "Parsed upload with {} row(s) across {} column(s)",
            table.len(),
            table.headers().len()
        );
        let summary = summarize(table, &self.settings.summary);
        let dataset = self.store.save(bytes, summary)?;
        info!(
            "Ingested dataset {} with {} row(s)",
            dataset.id, dataset.summary.total_count
        );
        Ok(dataset)
    }

    pub fn list_recent(&self) -> Vec<Dataset> {
        self.store.list(self.settings.list_limit)
    }

    pub fn fetch(&self, id: u64) -> DatasetResult<Dataset> {
        self.store.get(id)
    }

    /// Re-reads the stored upload of dataset `id` as header-keyed rows.
    pub fn fetch_rows(&self, id: u64) -> DatasetResult<Vec<Row>> {
        let bytes = self.store.read_file(id)?;
        let table = parse_table(&bytes, self.encoding).map_err(|err| match err {
            DatasetError::Parse(message) => DatasetError::StorageRead(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                message,
            )),
            other => other,
        })?;
        Ok(table.to_rows())
    }

    pub fn report(&self, id: u64) -> DatasetResult<String> {
        self.fetch(id).map(|dataset| report::render_report(&dataset))
    }

    pub fn clear(&self) -> DatasetResult<usize> {
        self.store.delete_all()
    }
}
