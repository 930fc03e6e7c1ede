// src/error.rs

//! Error types for channel export

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reconciling and exporting channels
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Download error: {0}")]
    DownloadError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Repository locator that cannot be listed (bad URL, unsupported scheme)
    #[error("Invalid repository source '{url}': {reason}")]
    InvalidSource { url: String, reason: String },

    /// Hard link refused because source and export root live on different filesystems
    #[error("Cannot hard link {} to {}: export directory is on a different filesystem", .source_path.display(), .target.display())]
    CrossDevice { source_path: PathBuf, target: PathBuf },

    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
