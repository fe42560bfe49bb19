use log::debug;

use crate::data::Cell;

/// Running sample of one numeric column. Missing and non-numeric cells are skipped.
#[derive(Debug, Clone, Default)]
pub struct ColumnStats {
    name: String,
    values: Vec<f64>,
    sum: f64,
    skipped: usize,
}

impl ColumnStats {
    pub fn with_column(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_cells<'a>(name: &str, cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut stats = Self::with_column(name);
        for cell in cells {
            stats.add_cell(cell);
        }
        debug!(
            "Column '{}': {} numeric value(s), {} skipped",
            stats.name,
            stats.count(),
            stats.skipped
        );
        stats
    }

    pub fn add_cell(&mut self, cell: &Cell) {
        match cell.as_f64() {
            Some(value) => self.add_value(value),
            None => self.skipped += 1,
        }
    }

    pub fn add_value(&mut self, value: f64) {
        self.sum += value;
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    /// Sample standard deviation (n - 1 denominator); undefined below two values.
    pub fn std_dev(&self) -> Option<f64> {
        let count = self.values.len();
        if count < 2 {
            return None;
        }
        let mean = self.mean()?;
        let squares = self
            .values
            .iter()
            .map(|value| (value - mean) * (value - mean))
            .sum::<f64>();
        Some((squares / (count as f64 - 1.0)).sqrt())
    }

    /// Counts values whose z-score magnitude is strictly greater than `threshold`.
    ///
    /// Zero when the column is empty or its standard deviation is zero or undefined.
    pub fn anomaly_count(&self, threshold: f64) -> usize {
        let (Some(mean), Some(std_dev)) = (self.mean(), self.std_dev()) else {
            return 0;
        };
        if std_dev <= 0.0 {
            return 0;
        }
        self.values
            .iter()
            .filter(|value| ((*value - mean) / std_dev).abs() > threshold)
            .count()
    }
}
