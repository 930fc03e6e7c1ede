// src/db/schema.rs

//! Metadata store schema
//!
//! The export reads a snapshot of the Spacewalk relational schema. Only the
//! tables and columns the export queries are declared here; `create` is used
//! to build fixture stores for tests and local experiments.

use crate::error::Result;
use rusqlite::Connection;
use tracing::debug;

/// Tables the export depends on, in creation order
pub const TABLES: &[&str] = &[
    "web_customer",
    "rhnChannel",
    "rhnChannelCloned",
    "rhnPackageName",
    "rhnPackageEVR",
    "rhnPackageArch",
    "rhnChecksumType",
    "rhnChecksum",
    "rhnPackage",
    "rhnChannelPackage",
    "rhnContentSource",
    "rhnChannelContentSource",
];

/// Create the store schema in an empty database
pub fn create(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS web_customer (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rhnChannel (
            id INTEGER PRIMARY KEY,
            org_id INTEGER REFERENCES web_customer(id),
            label TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS rhnChannelCloned (
            id INTEGER PRIMARY KEY REFERENCES rhnChannel(id),
            original_id INTEGER NOT NULL REFERENCES rhnChannel(id)
        );

        CREATE TABLE IF NOT EXISTS rhnPackageName (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS rhnPackageEVR (
            id INTEGER PRIMARY KEY,
            epoch TEXT,
            version TEXT NOT NULL,
            release TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rhnPackageArch (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS rhnChecksumType (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS rhnChecksum (
            id INTEGER PRIMARY KEY,
            checksum_type_id INTEGER NOT NULL REFERENCES rhnChecksumType(id),
            checksum TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rhnPackage (
            id INTEGER PRIMARY KEY,
            org_id INTEGER REFERENCES web_customer(id),
            name_id INTEGER NOT NULL REFERENCES rhnPackageName(id),
            evr_id INTEGER NOT NULL REFERENCES rhnPackageEVR(id),
            package_arch_id INTEGER NOT NULL REFERENCES rhnPackageArch(id),
            checksum_id INTEGER NOT NULL REFERENCES rhnChecksum(id),
            package_size INTEGER NOT NULL,
            path TEXT
        );

        CREATE TABLE IF NOT EXISTS rhnChannelPackage (
            channel_id INTEGER NOT NULL REFERENCES rhnChannel(id),
            package_id INTEGER NOT NULL REFERENCES rhnPackage(id),
            PRIMARY KEY (channel_id, package_id)
        );

        CREATE TABLE IF NOT EXISTS rhnContentSource (
            id INTEGER PRIMARY KEY,
            org_id INTEGER REFERENCES web_customer(id),
            label TEXT NOT NULL,
            source_url TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rhnChannelContentSource (
            channel_id INTEGER NOT NULL REFERENCES rhnChannel(id),
            source_id INTEGER NOT NULL REFERENCES rhnContentSource(id),
            PRIMARY KEY (channel_id, source_id)
        );

        CREATE INDEX IF NOT EXISTS idx_channel_org ON rhnChannel(org_id);
        CREATE INDEX IF NOT EXISTS idx_channel_package_pkg ON rhnChannelPackage(package_id);
        ",
    )?;

    debug!("Created metadata store schema ({} tables)", TABLES.len());
    Ok(())
}

/// Check that every table the export queries is present
pub fn missing_tables(conn: &Connection) -> Result<Vec<&'static str>> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;

    let mut missing = Vec::new();
    for table in TABLES {
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        if count == 0 {
            missing.push(*table);
        }
    }
    Ok(missing)
}
