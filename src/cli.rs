// src/cli.rs
//! Command-line interface for channel-export
//!
//! Flags override values loaded from `--config`.

use channel_export::ExportConfig;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "channel-export")]
#[command(author, version)]
#[command(about = "Export channel packages not available from upstream repositories or parent channels", long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Export directory
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Overwrite exported files that are already present
    #[arg(short, long)]
    pub force: bool,

    /// Only report exported packages
    #[arg(long)]
    pub exported_only: bool,

    /// Do not build repository metadata for exported channels
    #[arg(long)]
    pub skip_repodata: bool,

    /// Don't check package size
    #[arg(short = 'S', long)]
    pub no_size: bool,

    /// Don't check package paths against package attributes
    #[arg(long)]
    pub no_layout_check: bool,

    /// Path to the metadata store
    #[arg(long = "db", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Prefix of the package store paths
    #[arg(long, value_name = "PATH")]
    pub mount_point: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Index the repositories of a channel one at a time
    #[arg(long)]
    pub serial_index: bool,

    /// Also write log output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    pub fn apply(&self, config: &mut ExportConfig) {
        config.verbose = config.verbose.max(self.verbose);
        if let Some(directory) = &self.directory {
            config.directory = directory.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(mount_point) = &self.mount_point {
            config.mount_point = mount_point.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }
        config.force |= self.force;
        config.exported_only |= self.exported_only;
        config.skip_metadata_build |= self.skip_repodata;
        config.check_size &= !self.no_size;
        config.check_layout &= !self.no_layout_check;
        config.parallel_indexing &= !self.serial_index;
    }
}
