// src/repository/mod.rs

//! Upstream repository listing and package indices
//!
//! This module provides:
//! - The `RepositoryLister` capability used to enumerate upstream packages
//! - Repository kind detection from a source locator
//! - A yum/dnf lister reading `repomd.xml` and `primary.xml`
//! - Per-channel package indices keyed by canonical identity

mod client;
mod index;
mod yum;

pub use client::{decode_metadata, MetadataFetcher, RepositoryClient, DEFAULT_TIMEOUT};
pub use index::{build_index, build_indices, find_repository, RepositoryIndex};
pub use yum::{parse_primary, primary_location, YumLister};

use crate::error::{Error, Result};
use crate::nevra::Nevra;
use url::Url;

/// Enumerates the packages currently available from a repository
///
/// Implementations must be shareable across threads; indices for one
/// channel may be built in parallel.
pub trait RepositoryLister: Send + Sync {
    /// List package identities available at `source_url`
    ///
    /// Returns `Error::InvalidSource` when the locator cannot be listed.
    fn list_packages(&self, label: &str, source_url: &str) -> Result<Vec<Nevra>>;
}

/// Kind of repository a source locator points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryKind {
    /// `file://` source; never indexed
    Local,
    /// Remote yum/dnf repository with its base URL (always ending in `/`)
    Yum(Url),
}

impl RepositoryKind {
    /// Classify a source locator
    pub fn detect(source_url: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidSource {
            url: source_url.to_string(),
            reason,
        };

        let mut url = Url::parse(source_url.trim()).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "file" => Ok(Self::Local),
            "http" | "https" | "ftp" => {
                if url.host_str().is_none_or(str::is_empty) {
                    return Err(invalid("missing host".to_string()));
                }
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                Ok(Self::Yum(url))
            }
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }
}

/// Lister dispatching on `RepositoryKind`
///
/// This is the production lister; local sources are rejected, remote ones
/// are read as yum repositories.
pub struct DefaultLister {
    yum: YumLister,
}

impl DefaultLister {
    pub fn new(client: RepositoryClient) -> Self {
        Self {
            yum: YumLister::new(client),
        }
    }
}

impl RepositoryLister for DefaultLister {
    fn list_packages(&self, label: &str, source_url: &str) -> Result<Vec<Nevra>> {
        match RepositoryKind::detect(source_url)? {
            RepositoryKind::Yum(_) => self.yum.list_packages(label, source_url),
            RepositoryKind::Local => Err(Error::InvalidSource {
                url: source_url.to_string(),
                reason: "local sources are not indexed".to_string(),
            }),
        }
    }
}
