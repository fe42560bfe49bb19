//! Statistical summary of an uploaded equipment table.
//!
//! [`summarize`] is pure: it caps the table at [`SummaryConfig::row_cap`] rows
//! with a seeded subsample, then computes per-column means, z-score anomaly
//! counts and the categorical distribution.

use std::collections::BTreeMap;

use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::index};
use serde::{Deserialize, Serialize};

use crate::{
    config::SummaryConfig, data::RawTable, frequency::FrequencyAccumulator, stats::ColumnStats,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_count: usize,
    /// Mean per numeric column; `None` when the column is absent or holds no numbers.
    pub averages: BTreeMap<String, Option<f64>>,
    pub anomalies: BTreeMap<String, usize>,
    pub type_distribution: BTreeMap<String, usize>,
}

/// Reduces `table` to at most `cap` rows chosen uniformly with a fixed seed.
///
/// The kept rows stay in their original relative order. Tables at or below the
/// cap are left untouched.
pub fn sample_rows(table: &mut RawTable, cap: usize, seed: u64) {
    let len = table.len();
    if len <= cap {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, len, cap).into_vec();
    picked.sort_unstable();
    table.retain_indices(&picked);
    debug!("Sampled {cap} of {len} row(s) with seed {seed}");
}

pub fn summarize(mut table: RawTable, config: &SummaryConfig) -> Summary {
    sample_rows(&mut table, config.row_cap, config.sample_seed);

    let mut averages = BTreeMap::new();
    let mut anomalies = BTreeMap::new();
    for name in config.numeric_columns() {
        match table.column(name) {
            Some(cells) => {
                let stats = ColumnStats::from_cells(name, cells);
                averages.insert(name.to_string(), stats.mean());
                anomalies.insert(name.to_string(), stats.anomaly_count(config.z_threshold));
            }
            None => {
                averages.insert(name.to_string(), None);
                anomalies.insert(name.to_string(), 0);
            }
        }
    }

    let type_distribution = config
        .categorical_column()
        .and_then(|name| Some((name, table.column(name)?)))
        .map(|(name, cells)| {
            let accumulator = FrequencyAccumulator::from_cells(cells);
            debug!(
                "Column '{name}': {} categorized value(s), ranked {:?}",
                accumulator.total(),
                accumulator.ranked()
            );
            accumulator.into_counts()
        })
        .unwrap_or_default();

    Summary {
        total_count: table.len(),
        averages,
        anomalies,
        type_distribution,
    }
}
