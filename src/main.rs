// src/main.rs

mod cli;

use anyhow::{Context, Result};
use channel_export::{db, DefaultLister, ExportConfig, Exporter, RepositoryClient};
use clap::Parser;
use cli::Cli;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Stderr output filtered by RUST_LOG or verbosity; optional file copy at debug
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    let file_layer = match log_file {
        Some(path) => {
            let file: File = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .with(file_layer)
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };
    cli.apply(&mut config);

    init_logging(config.verbose, config.log_file.as_deref())?;

    config.validate()?;
    config.prepare_export_root()?;
    info!("Output directory: {}", config.directory.display());

    let conn = db::open(&config.database)
        .with_context(|| format!("Cannot open metadata store {}", config.database.display()))?;

    let client = RepositoryClient::with_settings(config.http.timeout(), config.http.max_attempts)?;
    let lister = DefaultLister::new(client);

    let summary = Exporter::new(&conn, &config, &lister).run()?;
    Ok(!summary.has_faults())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
