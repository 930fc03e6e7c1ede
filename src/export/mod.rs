// src/export/mod.rs

//! Hard-link export of packages into a channel directory
//!
//! Exported files are hard links to the canonical package store, so the
//! export root and the store must share a filesystem. A cross-device
//! failure is reported as `Error::CrossDevice` and never replaced by a copy.

pub mod integrity;

pub use integrity::{check_path_layout, check_size, expected_layout, LayoutMismatch, SizeMismatch};

use crate::error::{Error, Result};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, error, trace};

/// What `ExportWriter::export` did for one package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// New hard link created
    Linked,
    /// Existing file removed and linked again (`force`)
    Relinked,
    /// Target already present and left untouched
    AlreadyPresent,
    /// Source file not on disk; nothing exported
    SourceMissing,
}

impl ExportOutcome {
    /// Whether the export directory was modified
    pub fn changed(&self) -> bool {
        matches!(self, Self::Linked | Self::Relinked)
    }
}

/// Materialises packages in a channel export directory
#[derive(Debug, Clone, Copy)]
pub struct ExportWriter {
    force: bool,
}

impl ExportWriter {
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    /// Target path for `source` inside `export_dir`
    pub fn target_path(source: &Path, export_dir: &Path) -> Result<PathBuf> {
        let basename = source.file_name().ok_or_else(|| {
            Error::IoError(format!("Package path has no file name: {}", source.display()))
        })?;
        Ok(export_dir.join(basename))
    }

    /// Make `source` reachable from `export_dir` under its basename
    pub fn export(&self, source: &Path, export_dir: &Path) -> Result<ExportOutcome> {
        if !source.is_file() {
            error!("File missing: {}", source.display());
            return Ok(ExportOutcome::SourceMissing);
        }

        let target = Self::target_path(source, export_dir)?;
        if target.symlink_metadata().is_ok() {
            if !self.force {
                trace!("Already exported: {}", target.display());
                return Ok(ExportOutcome::AlreadyPresent);
            }

            fs::remove_file(&target).map_err(|e| {
                Error::IoError(format!("Failed to remove {}: {e}", target.display()))
            })?;
            link(source, &target)?;
            debug!("Re-linked {} -> {}", source.display(), target.display());
            return Ok(ExportOutcome::Relinked);
        }

        link(source, &target)?;
        trace!("Linked {} -> {}", source.display(), target.display());
        Ok(ExportOutcome::Linked)
    }
}

fn link(source: &Path, target: &Path) -> Result<()> {
    fs::hard_link(source, target).map_err(|e| link_error(e, source, target))
}

/// Map a failed `hard_link`; crossing filesystems gets its own variant
fn link_error(err: io::Error, source: &Path, target: &Path) -> Error {
    if err.kind() == ErrorKind::CrossesDevices {
        Error::CrossDevice {
            source_path: source.to_path_buf(),
            target: target.to_path_buf(),
        }
    } else {
        Error::IoError(format!(
            "Failed to link {} to {}: {err}",
            source.display(),
            target.display()
        ))
    }
}
