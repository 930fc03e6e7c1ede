// src/db/models.rs

//! Read-only views onto the metadata store
//!
//! Organizations, channels, content sources and channel packages are
//! never created or modified by the export; each type only knows how to
//! load itself from a row.

use crate::error::Result;
use crate::nevra;
use rusqlite::{Connection, Row};

/// An organization owning channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: i64,
    pub name: String,
}

impl Organization {
    /// List every organization, ordered by id
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM web_customer ORDER BY id")?;

        let orgs = stmt
            .query_map([], |row| {
                Ok(Self {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(orgs)
    }
}

/// A channel belonging to an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: i64,
    pub org_id: i64,
    pub label: String,
    pub package_count: i64,
    /// Channel this one was cloned from, if any
    pub original_id: Option<i64>,
}

impl Channel {
    /// List the channels of an organization, ordered by label
    pub fn list_for_org(conn: &Connection, org_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT c.id, c.org_id, c.label,
                    (SELECT COUNT(*) FROM rhnChannelPackage cp WHERE cp.channel_id = c.id),
                    cc.original_id
             FROM rhnChannel c
             LEFT JOIN rhnChannelCloned cc ON cc.id = c.id
             WHERE c.org_id = ?1
             ORDER BY c.label",
        )?;

        let channels = stmt
            .query_map([org_id], |row| {
                Ok(Self {
                    id: row.get(0)?,
                    org_id: row.get(1)?,
                    label: row.get(2)?,
                    package_count: row.get(3)?,
                    original_id: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(channels)
    }
}

/// An upstream repository associated with a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    pub id: i64,
    pub label: String,
    pub source_url: String,
}

impl ContentSource {
    /// Scheme prefix of sources that live on the local filesystem
    pub const LOCAL_SCHEME: &'static str = "file://";

    /// List the repositories of a channel, ordered by label
    pub fn list_for_channel(conn: &Connection, channel_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT cs.id, cs.label, cs.source_url
             FROM rhnContentSource cs
             JOIN rhnChannelContentSource ccs ON ccs.source_id = cs.id
             WHERE ccs.channel_id = ?1
             ORDER BY cs.label, cs.id",
        )?;

        let sources = stmt
            .query_map([channel_id], |row| {
                Ok(Self {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    source_url: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    /// Whether this source is a local directory rather than a mirror
    pub fn is_local(&self) -> bool {
        self.source_url.starts_with(Self::LOCAL_SCHEME)
    }
}

/// A package as seen through its channel membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPackage {
    pub id: i64,
    pub org_id: Option<i64>,
    pub package_size: i64,
    /// Storage path relative to the mount point; `None` when not materialised
    pub path: Option<String>,
    pub checksum: String,
    pub checksum_type: String,
    pub name: String,
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
    pub arch: String,
    /// Set when the original channel contains this exact package
    pub parent_package_id: Option<i64>,
    /// Original channel of the package's channel, if it was cloned
    pub parent_original_channel_id: Option<i64>,
}

const CHANNEL_PACKAGES_QUERY: &str = "
    SELECT p.id, p.org_id, p.package_size, p.path, c.checksum, ct.label,
           n.name, evr.epoch, evr.version, evr.release, a.label,
           ocp.package_id, cc.original_id
    FROM rhnChannelPackage cp
    JOIN rhnPackage p ON p.id = cp.package_id
    JOIN rhnChecksum c ON c.id = p.checksum_id
    JOIN rhnChecksumType ct ON ct.id = c.checksum_type_id
    JOIN rhnPackageName n ON n.id = p.name_id
    JOIN rhnPackageEVR evr ON evr.id = p.evr_id
    JOIN rhnPackageArch a ON a.id = p.package_arch_id
    LEFT JOIN rhnChannelCloned cc ON cc.id = cp.channel_id
    LEFT JOIN rhnChannelPackage ocp
           ON ocp.channel_id = cc.original_id AND ocp.package_id = p.id
    WHERE cp.channel_id = ?1
    ORDER BY n.name, evr.version, evr.release, a.label, p.id";

impl ChannelPackage {
    /// Stream the packages of a channel through `f`, in package name order
    ///
    /// Rows are pulled from the cursor one at a time; the channel is never
    /// held in memory as a whole. Returns the number of rows visited.
    pub fn for_each_in_channel<F>(conn: &Connection, channel_id: i64, mut f: F) -> Result<usize>
    where
        F: FnMut(ChannelPackage) -> Result<()>,
    {
        let mut stmt = conn.prepare(CHANNEL_PACKAGES_QUERY)?;
        let mut rows = stmt.query([channel_id])?;

        let mut visited = 0;
        while let Some(row) = rows.next()? {
            f(Self::from_row(row)?)?;
            visited += 1;
        }
        Ok(visited)
    }

    /// Collect the packages of a channel
    pub fn list_for_channel(conn: &Connection, channel_id: i64) -> Result<Vec<Self>> {
        let mut packages = Vec::new();
        Self::for_each_in_channel(conn, channel_id, |pkg| {
            packages.push(pkg);
            Ok(())
        })?;
        Ok(packages)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            org_id: row.get(1)?,
            package_size: row.get(2)?,
            path: row.get(3)?,
            checksum: row.get(4)?,
            checksum_type: row.get(5)?,
            name: row.get(6)?,
            epoch: row.get(7)?,
            version: row.get(8)?,
            release: row.get(9)?,
            arch: row.get(10)?,
            parent_package_id: row.get(11)?,
            parent_original_channel_id: row.get(12)?,
        })
    }

    /// Canonical identity string
    pub fn identity(&self) -> String {
        nevra::resolve(
            &self.name,
            self.epoch.as_deref(),
            &self.version,
            &self.release,
            &self.arch,
        )
    }

    /// Storage path, if the package is materialised
    ///
    /// The store does not distinguish an empty path from a null one; both
    /// mean there is no file.
    pub fn stored_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    /// File name component of the storage path
    pub fn basename(&self) -> Option<&str> {
        self.stored_path()
            .map(|p| p.rsplit('/').next().unwrap_or(p))
    }
}
