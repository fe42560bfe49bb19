use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Summarize equipment telemetry uploads and keep the most recent datasets",
    long_about = None
)]
pub struct Cli {
    /// Directory holding the dataset manifest and stored uploads
    #[arg(long, global = true, default_value = "media")]
    pub store: PathBuf,
    /// Optional YAML settings file (retention, row cap, column roles)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a CSV file: summarize it, store it and apply retention
    Ingest(IngestArgs),
    /// List the most recent datasets, newest first
    List(ListArgs),
    /// Print a dataset record with its summary as JSON
    Show(DatasetArgs),
    /// Print the stored rows of a dataset as JSON
    Rows(DatasetArgs),
    /// Render the text report for a dataset
    Report(ReportArgs),
    /// Delete every dataset and its stored file
    Clear,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// CSV file to upload
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Maximum number of datasets to show (defaults to the configured list limit)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DatasetArgs {
    /// Dataset identifier
    pub id: u64,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Dataset identifier
    pub id: u64,
    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
