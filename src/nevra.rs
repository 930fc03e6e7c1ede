// src/nevra.rs

//! Canonical package identity (NEVRA)
//!
//! Every cross-source comparison reduces to string equality on
//! `name-epoch:version-release.arch`. The format must match what the
//! upstream repository listing produces, so an absent epoch is always
//! rendered as `0`.

use std::fmt;
use std::str::FromStr;

/// Build the canonical identity string from package attributes
///
/// An absent (or empty) epoch is normalised to `"0"`.
pub fn resolve(name: &str, epoch: Option<&str>, version: &str, release: &str, arch: &str) -> String {
    let epoch = epoch.filter(|e| !e.is_empty()).unwrap_or("0");
    format!("{name}-{epoch}:{version}-{release}.{arch}")
}

/// Structured package identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nevra {
    pub name: String,
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Nevra {
    pub fn new(
        name: impl Into<String>,
        epoch: Option<String>,
        version: impl Into<String>,
        release: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            epoch: epoch.filter(|e| !e.is_empty()),
            version: version.into(),
            release: release.into(),
            arch: arch.into(),
        }
    }

    /// Epoch with absence normalised to `"0"`
    pub fn epoch_or_zero(&self) -> &str {
        self.epoch.as_deref().unwrap_or("0")
    }

    /// Canonical identity string
    pub fn canonical(&self) -> String {
        resolve(
            &self.name,
            self.epoch.as_deref(),
            &self.version,
            &self.release,
            &self.arch,
        )
    }
}

impl fmt::Display for Nevra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}:{}-{}.{}",
            self.name,
            self.epoch_or_zero(),
            self.version,
            self.release,
            self.arch
        )
    }
}

/// Error parsing a canonical identity string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NevraParseError {
    #[error("NEVRA '{0}' has no epoch separator ':'")]
    MissingEpoch(String),
    #[error("NEVRA '{0}' has no name before the epoch")]
    MissingName(String),
    #[error("NEVRA '{0}' has a non-numeric epoch")]
    InvalidEpoch(String),
    #[error("NEVRA '{0}' has no architecture")]
    MissingArch(String),
    #[error("NEVRA '{0}' has no version-release")]
    MissingRelease(String),
}

impl FromStr for Nevra {
    type Err = NevraParseError;

    /// Parse `name-epoch:version-release.arch`
    ///
    /// The name may contain dashes; the epoch is the digits after its last
    /// dash. The version holds no dash, the release runs to the last dot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let colon = s
            .find(':')
            .ok_or_else(|| NevraParseError::MissingEpoch(s.to_string()))?;
        let (head, tail) = (&s[..colon], &s[colon + 1..]);

        let dash = head
            .rfind('-')
            .ok_or_else(|| NevraParseError::MissingName(s.to_string()))?;
        let (name, epoch) = (&head[..dash], &head[dash + 1..]);
        if name.is_empty() {
            return Err(NevraParseError::MissingName(s.to_string()));
        }
        if epoch.is_empty() || !epoch.chars().all(|c| c.is_ascii_digit()) {
            return Err(NevraParseError::InvalidEpoch(s.to_string()));
        }

        let dot = tail
            .rfind('.')
            .ok_or_else(|| NevraParseError::MissingArch(s.to_string()))?;
        let (vr, arch) = (&tail[..dot], &tail[dot + 1..]);
        if arch.is_empty() {
            return Err(NevraParseError::MissingArch(s.to_string()));
        }

        let (version, release) = vr
            .split_once('-')
            .filter(|(v, r)| !v.is_empty() && !r.is_empty())
            .ok_or_else(|| NevraParseError::MissingRelease(s.to_string()))?;

        Ok(Self::new(
            name,
            Some(epoch.to_string()),
            version,
            release,
            arch,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_epoch_normalised() {
        assert_eq!(
            resolve("bash", None, "5.1.8", "6.el9", "x86_64"),
            resolve("bash", Some("0"), "5.1.8", "6.el9", "x86_64")
        );
        assert_eq!(
            resolve("bash", None, "5.1.8", "6.el9", "x86_64"),
            "bash-0:5.1.8-6.el9.x86_64"
        );
    }

    #[test]
    fn test_empty_epoch_treated_as_absent() {
        assert_eq!(
            resolve("zlib", Some(""), "1.2.11", "40.el9", "x86_64"),
            "zlib-0:1.2.11-40.el9.x86_64"
        );
        let nevra = Nevra::new("zlib", Some(String::new()), "1.2.11", "40.el9", "x86_64");
        assert_eq!(nevra.epoch, None);
    }

    #[test]
    fn test_display_matches_canonical() {
        let nevra = Nevra::new("openssl-libs", Some("1".to_string()), "3.0.7", "27.el9", "x86_64");
        assert_eq!(nevra.to_string(), "openssl-libs-1:3.0.7-27.el9.x86_64");
        assert_eq!(nevra.to_string(), nevra.canonical());
    }

    #[test]
    fn test_parse_dashed_name() {
        let nevra: Nevra = "python3-libs-0:3.9.18-1.el9_3.x86_64".parse().unwrap();
        assert_eq!(nevra.name, "python3-libs");
        assert_eq!(nevra.epoch.as_deref(), Some("0"));
        assert_eq!(nevra.version, "3.9.18");
        assert_eq!(nevra.release, "1.el9_3");
        assert_eq!(nevra.arch, "x86_64");
    }

    #[test]
    fn test_parse_round_trip() {
        for s in [
            "kernel-0:5.14.0-362.8.1.el9_3.x86_64",
            "perl-Carp-0:1.50-460.el9.noarch",
            "tzdata-0:2023c-1.el9.noarch",
            "grub2-efi-x64-1:2.06-70.el9_3.1.x86_64",
        ] {
            let nevra: Nevra = s.parse().unwrap();
            assert_eq!(nevra.to_string(), s);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            "bash-5.1.8-6.el9.x86_64".parse::<Nevra>(),
            Err(NevraParseError::MissingEpoch("bash-5.1.8-6.el9.x86_64".to_string()))
        );
        assert!(matches!(
            "bash-x:5.1.8-6.el9.x86_64".parse::<Nevra>(),
            Err(NevraParseError::InvalidEpoch(_))
        ));
        assert!(matches!(
            "-0:5.1.8-6.el9.x86_64".parse::<Nevra>(),
            Err(NevraParseError::MissingName(_))
        ));
        assert!(matches!(
            "bash-0:5.1.8.x86_64".parse::<Nevra>(),
            Err(NevraParseError::MissingRelease(_))
        ));
        assert!(matches!(
            "bash-0:5-1.".parse::<Nevra>(),
            Err(NevraParseError::MissingArch(_))
        ));
    }
}
