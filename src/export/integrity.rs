// src/export/integrity.rs

//! Integrity checks against the package store
//!
//! Neither check influences classification or export; mismatches are
//! returned to the caller, which logs them as faults.
//!
//! The store lays packages out as
//! `{prefix}/{org_id}/{checksum[..3]}/{name}/{[epoch:]version-release}/{arch}/{checksum}/{basename}`.
//! The expected basename reuses the last three characters of the stored
//! path as its extension, so anything but a three-letter extension will
//! always be reported as a basename mismatch.

use crate::db::models::ChannelPackage;
use crate::error::Result;
use std::fmt;
use std::fs;
use std::path::Path;

/// On-disk size differs from the recorded package size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    pub expected: i64,
    pub actual: u64,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs. {}", self.expected, self.actual)
    }
}

/// Compare the recorded size of a package with the file on disk
pub fn check_size(path: &Path, expected: i64) -> Result<Option<SizeMismatch>> {
    let actual = fs::metadata(path)?.len();
    if i64::try_from(actual).ok() == Some(expected) {
        Ok(None)
    } else {
        Ok(Some(SizeMismatch { expected, actual }))
    }
}

/// One path component that does not match the package attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMismatch {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} vs. {}", self.field, self.expected, self.actual)
    }
}

/// Number of `/`-separated components in a store path
const LAYOUT_COMPONENTS: usize = 8;

/// Path components recomputed from package attributes, in path order
///
/// The leading store prefix is not checked and therefore not included.
pub fn expected_layout(pkg: &ChannelPackage) -> [(&'static str, String); 7] {
    let path = pkg.path.as_deref().unwrap_or("");

    let org_id = pkg
        .org_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "NULL".to_string());
    let checksum_prefix: String = pkg.checksum.chars().take(3).collect();

    let mut evr = match pkg.epoch.as_deref() {
        Some(epoch) if !epoch.is_empty() => format!("{epoch}:"),
        _ => String::new(),
    };
    evr.push_str(&format!("{}-{}", pkg.version, pkg.release));

    let extension: String = {
        let chars: Vec<char> = path.chars().collect();
        chars[chars.len().saturating_sub(3)..].iter().collect()
    };
    let basename = format!(
        "{}-{}-{}.{}.{}",
        pkg.name, pkg.version, pkg.release, pkg.arch, extension
    );

    [
        ("org_id", org_id),
        ("checksum_prefix", checksum_prefix),
        ("name", pkg.name.clone()),
        ("evr", evr),
        ("arch", pkg.arch.clone()),
        ("checksum", pkg.checksum.clone()),
        ("basename", basename),
    ]
}

/// Recompute every store path component and report the ones that differ
///
/// A path with the wrong number of components yields a single
/// `components` mismatch.
pub fn check_path_layout(pkg: &ChannelPackage) -> Vec<LayoutMismatch> {
    let Some(path) = pkg.stored_path() else {
        return Vec::new();
    };

    let actual: Vec<&str> = path.split('/').collect();
    if actual.len() != LAYOUT_COMPONENTS {
        return vec![LayoutMismatch {
            field: "components",
            expected: LAYOUT_COMPONENTS.to_string(),
            actual: actual.len().to_string(),
        }];
    }

    expected_layout(pkg)
        .into_iter()
        .zip(actual.into_iter().skip(1))
        .filter(|((_, expected), actual)| expected.as_str() != *actual)
        .map(|((field, expected), actual)| LayoutMismatch {
            field,
            expected,
            actual: actual.to_string(),
        })
        .collect()
}
