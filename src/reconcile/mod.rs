// src/reconcile/mod.rs

//! Per-package reconciliation against parent channels and upstream repositories
//!
//! Every package with a storage path gets exactly one `Classification`,
//! decided by a fixed cascade where the first match wins:
//!
//! 1. `InParent`: the channel is a clone and its original carries this package id
//! 2. `InRepository`: some upstream repository lists the canonical identity
//! 3. `Missing`: neither; the package is exported

mod exporter;

pub use exporter::Exporter;

use crate::db::models::ChannelPackage;
use crate::repository::{find_repository, RepositoryIndex};
use std::fmt;
use std::ops::AddAssign;

/// Where a channel package is already available
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    InParent { original_channel_id: i64 },
    InRepository { repo_id: i64, label: String },
    Missing,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InParent { original_channel_id } => {
                write!(f, "in parent channel {}", original_channel_id)
            }
            Self::InRepository { repo_id, label } => {
                write!(f, "in repository {} ({})", label, repo_id)
            }
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// Classify one package; `identity` is its canonical NEVRA
pub fn classify(
    pkg: &ChannelPackage,
    identity: &str,
    indices: &[RepositoryIndex],
) -> Classification {
    if let (Some(_), Some(original_channel_id)) =
        (pkg.parent_package_id, pkg.parent_original_channel_id)
    {
        return Classification::InParent {
            original_channel_id,
        };
    }

    match find_repository(indices, identity) {
        Some(index) => Classification::InRepository {
            repo_id: index.repo_id,
            label: index.label.clone(),
        },
        None => Classification::Missing,
    }
}

/// Per-channel tallies, for summaries only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelCounters {
    pub in_parent: usize,
    pub in_repo: usize,
    pub missing: usize,
    /// Missing packages present in the channel directory after export
    pub exported: usize,
    /// Of those, links created or replaced by this run
    pub linked: usize,
    pub skipped: usize,
    pub export_faults: usize,
    pub integrity_faults: usize,
}

impl ChannelCounters {
    pub fn record(&mut self, classification: &Classification) {
        match classification {
            Classification::InParent { .. } => self.in_parent += 1,
            Classification::InRepository { .. } => self.in_repo += 1,
            Classification::Missing => self.missing += 1,
        }
    }

    /// Packages that received a classification
    pub fn classified(&self) -> usize {
        self.in_parent + self.in_repo + self.missing
    }
}

impl AddAssign for ChannelCounters {
    fn add_assign(&mut self, other: Self) {
        self.in_parent += other.in_parent;
        self.in_repo += other.in_repo;
        self.missing += other.missing;
        self.exported += other.exported;
        self.linked += other.linked;
        self.skipped += other.skipped;
        self.export_faults += other.export_faults;
        self.integrity_faults += other.integrity_faults;
    }
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub organizations: usize,
    pub failed_organizations: usize,
    pub channels: usize,
    pub failed_channels: usize,
    pub totals: ChannelCounters,
}

impl RunSummary {
    /// Whether any fault should be surfaced through the exit status
    pub fn has_faults(&self) -> bool {
        self.failed_organizations > 0 || self.failed_channels > 0 || self.totals.export_faults > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} organizations, {} channels ({} failed): missing {} (exported {}, newly linked {}), in repositories {}, in parent {}, skipped {}, export faults {}, integrity faults {}",
            self.organizations,
            self.channels,
            self.failed_channels,
            self.totals.missing,
            self.totals.exported,
            self.totals.linked,
            self.totals.in_repo,
            self.totals.in_parent,
            self.totals.skipped,
            self.totals.export_faults,
            self.totals.integrity_faults,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn package() -> ChannelPackage {
        ChannelPackage {
            id: 100,
            org_id: Some(1),
            package_size: 3,
            path: Some("redhat/1/abc/vim/9.0-1/x86_64/abc/vim-9.0-1.x86_64.rpm".to_string()),
            checksum: "abc".to_string(),
            checksum_type: "sha256".to_string(),
            name: "vim".to_string(),
            epoch: Some("2".to_string()),
            version: "9.0".to_string(),
            release: "1".to_string(),
            arch: "x86_64".to_string(),
            parent_package_id: None,
            parent_original_channel_id: None,
        }
    }

    fn indices(identity: &str) -> Vec<RepositoryIndex> {
        vec![
            RepositoryIndex::new(1, "empty", HashSet::new()),
            RepositoryIndex::new(2, "first", HashSet::from([identity.to_string()])),
            RepositoryIndex::new(3, "second", HashSet::from([identity.to_string()])),
        ]
    }

    #[test]
    fn test_missing_without_sources() {
        let pkg = package();
        assert_eq!(classify(&pkg, &pkg.identity(), &[]), Classification::Missing);
    }

    #[test]
    fn test_first_repository_wins() {
        let pkg = package();
        let identity = pkg.identity();
        assert_eq!(
            classify(&pkg, &identity, &indices(&identity)),
            Classification::InRepository {
                repo_id: 2,
                label: "first".to_string()
            }
        );
    }

    #[test]
    fn test_parent_takes_precedence() {
        let mut pkg = package();
        pkg.parent_package_id = Some(100);
        pkg.parent_original_channel_id = Some(10);
        let identity = pkg.identity();

        assert_eq!(
            classify(&pkg, &identity, &indices(&identity)),
            Classification::InParent {
                original_channel_id: 10
            }
        );
    }

    #[test]
    fn test_parent_requires_both_columns() {
        let mut pkg = package();
        pkg.parent_original_channel_id = Some(10);
        assert_eq!(classify(&pkg, &pkg.identity(), &[]), Classification::Missing);

        pkg.parent_original_channel_id = None;
        pkg.parent_package_id = Some(100);
        assert_eq!(classify(&pkg, &pkg.identity(), &[]), Classification::Missing);
    }

    #[test]
    fn test_identity_must_match_exactly() {
        let pkg = package();
        let other_epoch = indices("vim-0:9.0-1.x86_64");
        assert_eq!(classify(&pkg, &pkg.identity(), &other_epoch), Classification::Missing);
    }

    #[test]
    fn test_counters() {
        let mut counters = ChannelCounters::default();
        counters.record(&Classification::Missing);
        counters.record(&Classification::InParent {
            original_channel_id: 1,
        });
        counters.record(&Classification::InRepository {
            repo_id: 1,
            label: "r".to_string(),
        });
        counters.record(&Classification::Missing);
        counters.skipped += 1;
        counters.exported += 2;
        counters.linked += 1;

        assert_eq!(counters.classified(), 4);
        assert_eq!(counters.missing, 2);

        let mut summary = RunSummary::default();
        summary.totals += counters;
        summary.totals += counters;
        assert_eq!(summary.totals.missing, 4);
        assert_eq!(summary.totals.skipped, 2);
        assert_eq!(summary.totals.exported, 4);
        assert_eq!(summary.totals.linked, 2);
        assert!(!summary.has_faults());
        assert!(summary.to_string().contains("missing 4 (exported 4, newly linked 2)"));

        summary.totals.export_faults = 1;
        assert!(summary.has_faults());
    }
}
