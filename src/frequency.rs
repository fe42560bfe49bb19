use std::collections::BTreeMap;

use crate::data::Cell;

/// Tallies distinct values of a categorical column. Missing cells are not counted.
#[derive(Debug, Clone, Default)]
pub struct FrequencyAccumulator {
    total: usize,
    counts: BTreeMap<String, usize>,
}

impl FrequencyAccumulator {
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut accumulator = Self::default();
        for cell in cells {
            accumulator.ingest(cell);
        }
        accumulator
    }

    pub fn ingest(&mut self, cell: &Cell) {
        if cell.is_missing() {
            return;
        }
        self.total += 1;
        *self.counts.entry(cell.as_display()).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Values ordered by descending count, ties broken by value.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut items = self
            .counts
            .iter()
            .map(|(value, count)| (value.as_str(), *count))
            .collect::<Vec<_>>();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    pub fn into_counts(self) -> BTreeMap<String, usize> {
        self.counts
    }
}
