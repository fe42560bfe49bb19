use std::collections::HashSet;

use encoding_rs::Encoding;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DatasetError, DatasetResult},
    io_utils,
};

/// Field spellings treated as a missing value, in addition to the empty field.
pub const MISSING_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// A single parsed CSV field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => Cell::Number(number),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view of the cell; text that does not parse as a number yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Cell::Missing => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }
}

/// One row keyed by column header in file order, as handed back to clients.
pub type Row = IndexMap<String, Cell>;

/// Header-derived table of parsed cells. Every row holds exactly one cell per header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding short rows with missing cells.
    ///
    /// Rows wider than the header are rejected.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) -> DatasetResult<()> {
        if cells.len() > self.headers.len() {
            return Err(DatasetError::Parse(format!(
                "Expected {} field(s) in row {}, saw {}",
                self.headers.len(),
                self.rows.len() + 2,
                cells.len()
            )));
        }
        cells.resize(self.headers.len(), Cell::Missing);
        self.rows.push(cells);
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of the named column in row order, or `None` when the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Keeps only the rows at `indices`, in the order given.
    pub fn retain_indices(&mut self, indices: &[usize]) {
        let mut taken = std::mem::take(&mut self.rows)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        self.rows = indices
            .iter()
            .filter_map(|&idx| taken.get_mut(idx).and_then(Option::take))
            .collect();
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|cells| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().cloned())
                    .collect::<Row>()
            })
            .collect()
    }
}

/// Parses uploaded bytes into a [`RawTable`].
///
/// Fails with [`DatasetError::Parse`] when the bytes cannot be decoded, the
/// header is missing or a record is malformed.
pub fn parse_table(bytes: &[u8], encoding: &'static Encoding) -> DatasetResult<RawTable> {
    let text = io_utils::decode_bytes(bytes, encoding)
        .map_err(|err| DatasetError::Parse(err.to_string()))?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), io_utils::DEFAULT_CSV_DELIMITER);
    let headers = reader
        .headers()
        .map_err(|err| DatasetError::Parse(err.to_string()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DatasetError::Parse("No columns to parse from file".to_string()));
    }

    let mut table = RawTable::new(dedupe_headers(headers));
    for (row_idx, record) in reader.records().enumerate() {
        let record = record
            .map_err(|err| DatasetError::Parse(format!("Reading row {}: {err}", row_idx + 2)))?;
        table.push_row(record.iter().map(Cell::parse).collect())?;
    }
    Ok(table)
}

/// Renames repeated headers to `name.1`, `name.2`, ... so every column keeps its own key.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .map(|header| {
            if seen.insert(header.clone()) {
                return header;
            }
            let mut suffix = 1;
            loop {
                let candidate = format!("{header}.{suffix}");
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                suffix += 1;
            }
        })
        .collect()
}
