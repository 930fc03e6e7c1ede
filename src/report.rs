// src/report.rs

//! CSV reports written next to the exported packages
//!
//! - `{root}/export.csv`: one row per processed channel
//! - `{root}/{org_id}/{channel_id}.csv`: one row per classified package
//!
//! Rows appear in the order they are recorded, which is the engine's
//! streaming order. Downstream tooling diffs reports across runs, so the
//! output must be identical for identical input.

use crate::db::models::{Channel, ChannelPackage};
use crate::error::Result;
use crate::reconcile::Classification;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Per-channel report columns
pub const CHANNEL_REPORT_HEADER: [&str; 7] = [
    "org_id",
    "channel_id",
    "channel_label",
    "package_nevra",
    "package_rpm_basename",
    "in_repo_id",
    "in_parent_original_id",
];

/// Top-level index columns
pub const EXPORT_INDEX_HEADER: [&str; 3] = ["org_id", "channel_id", "channel_label"];

/// File name of the top-level index inside the export root
pub const EXPORT_INDEX_FILE: &str = "export.csv";

/// One classified package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub org_id: i64,
    pub channel_id: i64,
    pub channel_label: String,
    pub package_nevra: String,
    pub package_rpm_basename: String,
    pub in_repo_id: Option<i64>,
    pub in_parent_original_id: Option<i64>,
}

impl ReportRow {
    pub fn new(channel: &Channel, pkg: &ChannelPackage, classification: &Classification) -> Self {
        let (in_repo_id, in_parent_original_id) = match classification {
            Classification::InParent { original_channel_id } => (None, Some(*original_channel_id)),
            Classification::InRepository { repo_id, .. } => (Some(*repo_id), None),
            Classification::Missing => (None, None),
        };

        Self {
            org_id: channel.org_id,
            channel_id: channel.id,
            channel_label: channel.label.clone(),
            package_nevra: pkg.identity(),
            package_rpm_basename: pkg.basename().unwrap_or_default().to_string(),
            in_repo_id,
            in_parent_original_id,
        }
    }

    /// Neither a repository nor the parent channel provides the package
    pub fn is_missing(&self) -> bool {
        self.in_repo_id.is_none() && self.in_parent_original_id.is_none()
    }
}

fn headerless_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer)
}

/// Report for one channel
pub struct ChannelReport<W: Write> {
    writer: csv::Writer<W>,
    exported_only: bool,
    rows: usize,
}

impl ChannelReport<File> {
    /// Create (truncating) the report file at `path`
    pub fn create(path: &Path, exported_only: bool) -> Result<Self> {
        Self::from_writer(File::create(path)?, exported_only)
    }
}

impl<W: Write> ChannelReport<W> {
    /// Start a report; the header is written immediately
    pub fn from_writer(writer: W, exported_only: bool) -> Result<Self> {
        let mut writer = headerless_writer(writer);
        writer.write_record(CHANNEL_REPORT_HEADER)?;
        Ok(Self {
            writer,
            exported_only,
            rows: 0,
        })
    }

    /// Append a row; returns false when the row was filtered out
    pub fn record(&mut self, row: &ReportRow) -> Result<bool> {
        if self.exported_only && !row.is_missing() {
            return Ok(false);
        }
        self.writer.serialize(row)?;
        self.rows += 1;
        Ok(true)
    }

    /// Rows written so far (header excluded)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::Error::IoError(format!("Failed to flush report: {}", e.error())))
    }
}

/// Top-level index of exported channels
pub struct ExportIndex<W: Write> {
    writer: csv::Writer<W>,
}

impl ExportIndex<File> {
    /// Create (truncating) `export.csv` inside `root`
    pub fn create(root: &Path) -> Result<Self> {
        Self::from_writer(File::create(root.join(EXPORT_INDEX_FILE))?)
    }
}

impl<W: Write> ExportIndex<W> {
    pub fn from_writer(writer: W) -> Result<Self> {
        let mut writer = headerless_writer(writer);
        writer.write_record(EXPORT_INDEX_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Record a channel and flush, so the row exists before its packages are processed
    pub fn record(&mut self, channel: &Channel) -> Result<()> {
        self.writer.write_record([
            channel.org_id.to_string(),
            channel.id.to_string(),
            channel.label.clone(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::Error::IoError(format!("Failed to flush index: {}", e.error())))
    }
}
