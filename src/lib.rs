pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod frequency;
pub mod io_utils;
pub mod report;
pub mod service;
pub mod stats;
pub mod storage;
pub mod store;
pub mod summary;

use std::{env, fs, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands},
    config::Settings,
    service::IngestService,
    store::DatasetStore,
};

pub use crate::{
    data::{Cell, RawTable, Row},
    error::{DatasetError, DatasetResult},
    store::Dataset,
    summary::{Summary, summarize},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("equipment_datasets", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    debug!("Using settings: {settings:?}");
    let store = DatasetStore::open(&cli.store, settings.retention)
        .with_context(|| format!("Opening dataset store at {:?}", cli.store))?;
    let service = IngestService::new(store, settings)?;

    match cli.command {
        Commands::Ingest(args) => handle_ingest(&service, &args),
        Commands::List(args) => handle_list(&service, &args),
        Commands::Show(args) => {
            let dataset = service.fetch(args.id)?;
            print_json(&dataset)
        }
        Commands::Rows(args) => {
            let rows = service.fetch_rows(args.id)?;
            print_json(&serde_json::json!({ "rows": rows }))
        }
        Commands::Report(args) => handle_report(&service, &args),
        Commands::Clear => {
            let removed = service.clear()?;
            info!("Cleared {removed} dataset(s)");
            Ok(())
        }
    }
}

fn handle_ingest(service: &IngestService, args: &cli::IngestArgs) -> Result<()> {
    info!("Ingesting {:?}", args.input);
    let bytes =
        fs::read(&args.input).with_context(|| format!("Reading input file {:?}", args.input))?;
    let dataset = service
        .ingest(&bytes)
        .with_context(|| format!("Ingesting {:?}", args.input))?;
    print_json(&dataset)
}

fn handle_list(service: &IngestService, args: &cli::ListArgs) -> Result<()> {
    let datasets = match args.limit {
        Some(limit) => service.store().list(limit),
        None => service.list_recent(),
    };
    if args.json {
        print_json(&datasets)
    } else {
        print!("{}", report::render_listing(&datasets));
        Ok(())
    }
}

fn handle_report(service: &IngestService, args: &cli::ReportArgs) -> Result<()> {
    let text = service.report(args.id)?;
    match &args.output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Writing report to {path:?}"))?;
            info!("Report for dataset {} written to {:?}", args.id, path);
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing output")?;
    println!("{rendered}");
    Ok(())
}
