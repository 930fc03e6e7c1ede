// src/repository/index.rs

//! Per-repository sets of available package identities

use super::RepositoryLister;
use crate::db::models::ContentSource;
use crate::error::Error;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Canonical identities available from one upstream repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIndex {
    pub repo_id: i64,
    pub label: String,
    pub packages: HashSet<String>,
}

impl RepositoryIndex {
    pub fn new(repo_id: i64, label: impl Into<String>, packages: HashSet<String>) -> Self {
        Self {
            repo_id,
            label: label.into(),
            packages,
        }
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.packages.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Build the index for a single repository
///
/// Listing failures never propagate: an invalid locator is reported as a
/// warning, any other failure as an error, and the repository contributes
/// an empty set.
pub fn build_index(source: &ContentSource, lister: &dyn RepositoryLister) -> RepositoryIndex {
    let packages = match lister.list_packages(&source.label, &source.source_url) {
        Ok(listed) => listed.iter().map(|nevra| nevra.canonical()).collect(),
        Err(Error::InvalidSource { url, reason }) => {
            warn!("Invalid repo source_url {} for {}: {}", url, source.label, reason);
            HashSet::new()
        }
        Err(e) => {
            error!("Failed to list repository {}: {}", source.label, e);
            HashSet::new()
        }
    };

    let index = RepositoryIndex::new(source.id, source.label.clone(), packages);
    debug!("  - repo {} with: {} packages.", index.label, index.len());
    index
}

/// Build indices for every non-local repository of a channel
///
/// The result keeps the order of `sources`, which is the order used to
/// pick the satisfying repository when several list the same package.
pub fn build_indices(
    sources: &[ContentSource],
    lister: &dyn RepositoryLister,
    parallel: bool,
) -> Vec<RepositoryIndex> {
    let remote: Vec<&ContentSource> = sources
        .iter()
        .filter(|source| {
            if source.is_local() {
                debug!("  - local repo: {}. Skipping.", source.label);
                false
            } else {
                true
            }
        })
        .collect();

    if parallel && remote.len() > 1 {
        remote
            .par_iter()
            .map(|source| build_index(source, lister))
            .collect()
    } else {
        remote
            .iter()
            .map(|source| build_index(source, lister))
            .collect()
    }
}

/// First repository, in enumeration order, that lists `identity`
pub fn find_repository<'a>(
    indices: &'a [RepositoryIndex],
    identity: &str,
) -> Option<&'a RepositoryIndex> {
    indices.iter().find(|index| index.contains(identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::nevra::Nevra;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeLister {
        listings: HashMap<String, Vec<Nevra>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeLister {
        fn new(listings: Vec<(&str, Vec<&str>)>) -> Self {
            let listings = listings
                .into_iter()
                .map(|(url, ids)| {
                    let nevras: Vec<Nevra> = ids.iter().map(|s| s.parse().unwrap()).collect();
                    (url.to_string(), nevras)
                })
                .collect();
            Self {
                listings,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl RepositoryLister for FakeLister {
        fn list_packages(&self, _label: &str, source_url: &str) -> Result<Vec<Nevra>> {
            self.calls.lock().unwrap().push(source_url.to_string());
            match self.listings.get(source_url) {
                Some(list) => Ok(list.clone()),
                None if source_url.starts_with("bogus") => Err(Error::InvalidSource {
                    url: source_url.to_string(),
                    reason: "test".to_string(),
                }),
                None => Err(Error::DownloadError("HTTP 404".to_string())),
            }
        }
    }

    fn source(id: i64, label: &str, url: &str) -> ContentSource {
        ContentSource {
            id,
            label: label.to_string(),
            source_url: url.to_string(),
        }
    }

    #[test]
    fn test_local_sources_never_consulted() {
        let lister = FakeLister::new(vec![("https://a/", vec!["bash-0:5.1-1.x86_64"])]);
        let sources = vec![
            source(1, "a", "https://a/"),
            source(2, "local", "file:///srv/local"),
        ];

        let indices = build_indices(&sources, &lister, false);
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].repo_id, 1);
        assert_eq!(*lister.calls.lock().unwrap(), vec!["https://a/".to_string()]);
    }

    #[test]
    fn test_failures_degrade_to_empty_index() {
        let lister = FakeLister::new(Vec::new());
        let sources = vec![
            source(1, "broken", "bogus://x"),
            source(2, "gone", "https://gone/"),
        ];

        let indices = build_indices(&sources, &lister, false);
        assert_eq!(indices.len(), 2);
        assert!(indices.iter().all(RepositoryIndex::is_empty));
    }

    #[test]
    fn test_parallel_preserves_order() {
        let lister = FakeLister::new(vec![
            ("https://a/", vec!["a-0:1-1.noarch"]),
            ("https://b/", vec!["b-0:1-1.noarch"]),
            ("https://c/", vec!["c-0:1-1.noarch"]),
        ]);
        let sources = vec![
            source(1, "a", "https://a/"),
            source(2, "b", "https://b/"),
            source(3, "c", "https://c/"),
        ];

        let indices = build_indices(&sources, &lister, true);
        let ids: Vec<i64> = indices.iter().map(|i| i.repo_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_find_repository_first_match_wins() {
        let shared = "vim-2:9.0-1.x86_64".to_string();
        let indices = vec![
            RepositoryIndex::new(7, "first", HashSet::from([shared.clone()])),
            RepositoryIndex::new(8, "second", HashSet::from([shared.clone()])),
        ];

        assert_eq!(find_repository(&indices, &shared).unwrap().repo_id, 7);
        assert!(find_repository(&indices, "other-0:1-1.x86_64").is_none());
    }
}
