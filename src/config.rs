//! Runtime settings for summarization and retention.
//!
//! Settings are plain serde structs with defaults for every field, so a YAML
//! file only needs to name what it overrides:
//!
//! ```yaml
//! retention: 5
//! summary:
//!   row_cap: 50000
//!   z_threshold: 3.0
//! ```

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RETENTION: usize = 5;
pub const DEFAULT_LIST_LIMIT: usize = 5;
pub const DEFAULT_ROW_CAP: usize = 50_000;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub role: ColumnRole,
}

impl ColumnSpec {
    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            role: ColumnRole::Numeric,
        }
    }

    pub fn categorical(name: &str) -> Self {
        Self {
            name: name.to_string(),
            role: ColumnRole::Categorical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    /// Tables longer than this are subsampled before any statistic is computed.
    pub row_cap: usize,
    pub sample_seed: u64,
    /// Values whose z-score magnitude exceeds this are counted as anomalies.
    pub z_threshold: f64,
    pub columns: Vec<ColumnSpec>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            row_cap: DEFAULT_ROW_CAP,
            sample_seed: DEFAULT_SAMPLE_SEED,
            z_threshold: DEFAULT_Z_THRESHOLD,
            columns: vec![
                ColumnSpec::numeric("Flowrate"),
                ColumnSpec::numeric("Pressure"),
                ColumnSpec::numeric("Temperature"),
                ColumnSpec::categorical("Type"),
            ],
        }
    }
}

impl SummaryConfig {
    pub fn numeric_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::Numeric)
            .map(|c| c.name.as_str())
    }

    pub fn categorical_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.role == ColumnRole::Categorical)
            .map(|c| c.name.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        if self.row_cap == 0 {
            bail!("summary.row_cap must be at least 1");
        }
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            bail!(
                "summary.z_threshold must be a positive number, got {}",
                self.z_threshold
            );
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                bail!("summary.columns contains an empty column name");
            }
            if !seen.insert(column.name.as_str()) {
                bail!("Column '{}' is listed more than once", column.name);
            }
        }
        let categorical = self
            .columns
            .iter()
            .filter(|c| c.role == ColumnRole::Categorical)
            .count();
        if categorical != 1 {
            bail!("Exactly one categorical column is required, found {categorical}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Number of most recent datasets kept after every upload.
    pub retention: usize,
    pub list_limit: usize,
    /// Encoding label for uploaded files; UTF-8 when unset.
    pub input_encoding: Option<String>,
    pub summary: SummaryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            list_limit: DEFAULT_LIST_LIMIT,
            input_encoding: None,
            summary: SummaryConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Opening settings file {path:?}"))?;
        Self::from_yaml_str(&contents).with_context(|| format!("Parsing settings file {path:?}"))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let settings: Settings = if contents.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.retention == 0 {
            bail!("retention must be at least 1");
        }
        if self.list_limit == 0 {
            bail!("list_limit must be at least 1");
        }
        self.summary.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_equipment_layout() {
        let settings = Settings::default();
        assert_eq!(settings.retention, 5);
        assert_eq!(settings.list_limit, 5);
        assert_eq!(settings.summary.row_cap, 50_000);
        assert_eq!(settings.summary.sample_seed, 42);
        assert_eq!(settings.summary.z_threshold, 3.0);
        assert_eq!(
            settings.summary.numeric_columns().collect::<Vec<_>>(),
            vec!["Flowrate", "Pressure", "Temperature"]
        );
        assert_eq!(settings.summary.categorical_column(), Some("Type"));
        settings.validate().unwrap();
    }

    #[test]
    fn yaml_overrides_merge_with_defaults() {
        let settings = Settings::from_yaml_str("retention: 3\nsummary:\n  row_cap: 10\n").unwrap();
        assert_eq!(settings.retention, 3);
        assert_eq!(settings.list_limit, 5);
        assert_eq!(settings.summary.row_cap, 10);
        assert_eq!(settings.summary.z_threshold, 3.0);
        assert_eq!(settings.summary.columns.len(), 4);
    }

    #[test]
    fn yaml_column_roles_parse() {
        let yaml = "summary:\n  columns:\n    - { name: Level, role: numeric }\n    - { name: Unit, role: categorical }\n";
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(
            settings.summary.columns,
            vec![ColumnSpec::numeric("Level"), ColumnSpec::categorical("Unit")]
        );
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        assert_eq!(Settings::from_yaml_str("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(Settings::from_yaml_str("retention: 0").is_err());
        assert!(Settings::from_yaml_str("summary:\n  z_threshold: -1.0").is_err());
        let duplicate = "summary:\n  columns:\n    - { name: A, role: numeric }\n    - { name: A, role: categorical }\n";
        assert!(Settings::from_yaml_str(duplicate).is_err());
        let no_category = "summary:\n  columns:\n    - { name: A, role: numeric }\n";
        assert!(Settings::from_yaml_str(no_category).is_err());
    }
}
