// src/config.rs
//! Run configuration
//!
//! Loaded from an optional TOML file, then overridden by command-line
//! flags. Sections:
//! - top level: export root, metadata store, behaviour switches
//! - [http]: upstream repository requests
//! - [createrepo]: metadata build invocation

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Everything an export run needs to know
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Export root; required, usually given on the command line
    #[serde(default)]
    pub directory: PathBuf,

    /// Metadata store
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Prefix joined to the stored package paths
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,

    #[serde(default)]
    pub verbose: u8,

    /// Replace files already present in a channel directory
    #[serde(default)]
    pub force: bool,

    /// Only report packages that were exported
    #[serde(default)]
    pub exported_only: bool,

    #[serde(default)]
    pub skip_metadata_build: bool,

    #[serde(default = "default_true")]
    pub check_size: bool,

    #[serde(default = "default_true")]
    pub check_layout: bool,

    /// Build the repository indices of a channel concurrently
    #[serde(default = "default_true")]
    pub parallel_indexing: bool,

    /// Duplicate log output into this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub createrepo: CreaterepoSection,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            database: default_database(),
            mount_point: default_mount_point(),
            verbose: 0,
            force: false,
            exported_only: false,
            skip_metadata_build: false,
            check_size: true,
            check_layout: true,
            parallel_indexing: true,
            log_file: None,
            http: HttpSection::default(),
            createrepo: CreaterepoSection::default(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("/var/lib/channel-export/spacewalk.db")
}

fn default_mount_point() -> PathBuf {
    PathBuf::from("/var/satellite")
}

fn default_true() -> bool {
    true
}

/// Upstream repository requests
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    /// Per-request timeout
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Attempts per request (1 = no retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl HttpSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

/// Repository metadata build
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreaterepoSection {
    #[serde(default = "default_createrepo_command")]
    pub command: String,

    /// Arguments placed before the channel directory
    #[serde(default = "default_createrepo_args")]
    pub args: Vec<String>,

    /// The build is killed after this long
    #[serde(default = "default_createrepo_timeout")]
    pub timeout_secs: u64,
}

impl Default for CreaterepoSection {
    fn default() -> Self {
        Self {
            command: default_createrepo_command(),
            args: default_createrepo_args(),
            timeout_secs: default_createrepo_timeout(),
        }
    }
}

impl CreaterepoSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_createrepo_command() -> String {
    "createrepo".to_string()
}

fn default_createrepo_args() -> Vec<String> {
    vec!["--no-database".to_string()]
}

fn default_createrepo_timeout() -> u64 {
    3600
}

impl ExportConfig {
    /// Default configuration exporting into `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Load a configuration file
    ///
    /// The result is not validated; command-line overrides are usually
    /// applied first.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::ConfigError(
                "No export directory given".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::ConfigError(
                "http.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.http.max_attempts == 0 {
            return Err(Error::ConfigError(
                "http.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.createrepo.timeout_secs == 0 {
            return Err(Error::ConfigError(
                "createrepo.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !self.skip_metadata_build && self.createrepo.command.trim().is_empty() {
            return Err(Error::ConfigError(
                "createrepo.command must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create the export root if needed and make sure it accepts new files
    pub fn prepare_export_root(&self) -> Result<()> {
        let root = &self.directory;
        fs::create_dir_all(root).map_err(|e| {
            Error::ConfigError(format!(
                "Cannot create export directory {}: {}",
                root.display(),
                e
            ))
        })?;

        if !root.is_dir() {
            return Err(Error::ConfigError(format!(
                "Export path {} is not a directory",
                root.display()
            )));
        }

        let marker = root.join(".channel-export-write-test");
        fs::write(&marker, b"")
            .and_then(|()| fs::remove_file(&marker))
            .map_err(|e| {
                Error::ConfigError(format!(
                    "Export directory {} is not writable: {}",
                    root.display(),
                    e
                ))
            })?;

        Ok(())
    }
}
