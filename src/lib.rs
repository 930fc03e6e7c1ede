// src/lib.rs

//! Channel export
//!
//! Reconciles the packages of software channels against the repositories
//! they mirror and the channels they were cloned from, and hard-links the
//! packages available from neither into a per-channel export directory.
//!
//! # Architecture
//!
//! - Metadata store: read-only SQLite snapshot of the channel database
//! - Identity: canonical NEVRA strings are the only cross-source match key
//! - Reconciliation: per package, InParent, then InRepository, then Missing
//! - Export: hard links only, idempotent, with size and path-layout checks
//! - Reports: deterministic CSV per channel plus a top-level index

pub mod compression;
pub mod config;
pub mod createrepo;
pub mod db;
mod error;
pub mod export;
pub mod nevra;
pub mod reconcile;
pub mod report;
pub mod repository;

pub use config::ExportConfig;
pub use error::{Error, Result};
pub use export::{ExportOutcome, ExportWriter};
pub use nevra::{Nevra, NevraParseError};
pub use reconcile::{classify, ChannelCounters, Classification, Exporter, RunSummary};
pub use report::{ChannelReport, ExportIndex, ReportRow};
pub use repository::{DefaultLister, RepositoryClient, RepositoryIndex, RepositoryKind, RepositoryLister};
