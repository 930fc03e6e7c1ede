// src/reconcile/exporter.rs

//! The export run: organizations, then channels, then packages

use super::{classify, ChannelCounters, Classification, RunSummary};
use crate::config::ExportConfig;
use crate::createrepo::MetadataBuilder;
use crate::db::models::{Channel, ChannelPackage, ContentSource, Organization};
use crate::error::Result;
use crate::export::{check_path_layout, check_size, ExportOutcome, ExportWriter};
use crate::report::{ChannelReport, ExportIndex, ReportRow};
use crate::repository::{build_indices, RepositoryLister};
use rusqlite::Connection;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, trace, warn};

/// Reconciles and exports every channel in the metadata store
pub struct Exporter<'a> {
    conn: &'a Connection,
    config: &'a ExportConfig,
    lister: &'a dyn RepositoryLister,
    writer: ExportWriter,
    metadata: MetadataBuilder,
}

impl<'a> Exporter<'a> {
    pub fn new(
        conn: &'a Connection,
        config: &'a ExportConfig,
        lister: &'a dyn RepositoryLister,
    ) -> Self {
        Self {
            conn,
            config,
            lister,
            writer: ExportWriter::new(config.force),
            metadata: MetadataBuilder::from_config(&config.createrepo),
        }
    }

    /// Process every organization and channel
    ///
    /// Only failures to create the top-level index or to enumerate
    /// organizations abort the run. Anything below that is logged and
    /// tallied in the returned summary.
    pub fn run(&self) -> Result<RunSummary> {
        let mut index = ExportIndex::create(&self.config.directory)?;
        let mut summary = RunSummary::default();

        for org in Organization::list_all(self.conn)? {
            let span = info_span!("org", id = org.id);
            let _enter = span.enter();

            info!("Processing organization: {}", org.name);
            summary.organizations += 1;

            let channels = match Channel::list_for_org(self.conn, org.id) {
                Ok(channels) => channels,
                Err(e) => {
                    error!("Failed to list channels of organization {}: {}", org.name, e);
                    summary.failed_organizations += 1;
                    continue;
                }
            };

            for channel in channels {
                summary.channels += 1;
                match self.export_channel(&channel, &mut index) {
                    Ok(counters) => summary.totals += counters,
                    Err(e) => {
                        error!("Failed to export channel {}: {}", channel.label, e);
                        summary.failed_channels += 1;
                    }
                }
            }
        }

        index.finish()?;
        info!("Export finished: {}", summary);
        Ok(summary)
    }

    /// Directory receiving the exported packages of `channel`
    pub fn channel_dir(&self, channel: &Channel) -> PathBuf {
        self.org_dir(channel).join(channel.id.to_string())
    }

    /// Report file of `channel`
    pub fn report_path(&self, channel: &Channel) -> PathBuf {
        self.org_dir(channel).join(format!("{}.csv", channel.id))
    }

    fn org_dir(&self, channel: &Channel) -> PathBuf {
        self.config.directory.join(channel.org_id.to_string())
    }

    /// Reconcile and export a single channel
    pub fn export_channel<W: Write>(
        &self,
        channel: &Channel,
        index: &mut ExportIndex<W>,
    ) -> Result<ChannelCounters> {
        let span = info_span!("channel", id = channel.id, label = %channel.label);
        let _enter = span.enter();

        info!(" * channel: {} ({} packages)", channel.label, channel.package_count);
        if let Some(original_id) = channel.original_id {
            debug!("  - cloned from channel {}", original_id);
        }

        let sources = ContentSource::list_for_channel(self.conn, channel.id)?;
        if sources.is_empty() {
            debug!("  - no repos associated");
        }
        let indices = build_indices(&sources, self.lister, self.config.parallel_indexing);

        index.record(channel)?;

        let channel_dir = self.channel_dir(channel);
        fs::create_dir_all(&channel_dir)?;
        let mut report = ChannelReport::create(&self.report_path(channel), self.config.exported_only)?;

        let mut counters = ChannelCounters::default();
        ChannelPackage::for_each_in_channel(self.conn, channel.id, |pkg| {
            let Some(path) = pkg.stored_path() else {
                trace!("No storage path for {}, skipping", pkg.identity());
                counters.skipped += 1;
                return Ok(());
            };

            let abs_path = self.config.mount_point.join(path);
            trace!("{}", abs_path.display());

            let identity = pkg.identity();
            let classification = classify(&pkg, &identity, &indices);
            trace!("{}: {}", identity, classification);
            counters.record(&classification);

            if let Classification::Missing = classification {
                self.export_package(&pkg, &abs_path, &channel_dir, &mut counters);
            }

            report.record(&ReportRow::new(channel, &pkg, &classification))?;
            Ok(())
        })?;
        report.finish()?;

        debug!(
            "  - exporting: {} / available: {} / in parent: {}",
            counters.missing, counters.in_repo, counters.in_parent
        );

        if self.config.skip_metadata_build {
            debug!("  - skipping repository metadata");
        } else if let Err(e) = self.metadata.build(&channel_dir) {
            error!("Repository metadata build failed for {}: {}", channel.label, e);
        }

        Ok(counters)
    }

    /// Export one Missing package and run the integrity checks on its source
    fn export_package(
        &self,
        pkg: &ChannelPackage,
        abs_path: &Path,
        channel_dir: &Path,
        counters: &mut ChannelCounters,
    ) {
        match self.writer.export(abs_path, channel_dir) {
            Ok(ExportOutcome::SourceMissing) => return,
            Ok(outcome) => {
                trace!("{:?}: {}", outcome, abs_path.display());
                counters.exported += 1;
                if outcome.changed() {
                    counters.linked += 1;
                }
            }
            Err(e) => {
                error!("Export failed for {}: {}", abs_path.display(), e);
                counters.export_faults += 1;
            }
        }

        if self.config.check_size {
            match check_size(abs_path, pkg.package_size) {
                Ok(None) => {}
                Ok(Some(mismatch)) => {
                    warn!("File size mismatch: {} ({})", abs_path.display(), mismatch);
                    counters.integrity_faults += 1;
                }
                Err(e) => {
                    warn!("Cannot check size of {}: {}", abs_path.display(), e);
                    counters.integrity_faults += 1;
                }
            }
        }

        if self.config.check_layout {
            let mismatches = check_path_layout(pkg);
            for mismatch in &mismatches {
                warn!("File path mismatch: {} ({})", abs_path.display(), mismatch);
            }
            counters.integrity_faults += mismatches.len();
        }
    }
}
