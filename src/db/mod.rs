// src/db/mod.rs

//! Read-only access to the channel metadata store
//!
//! The export never writes to the store. `open` enforces this with a
//! read-only connection and refuses stores missing any required table.

pub mod models;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info};

/// Open the metadata store read-only
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if !db_path.exists() {
        return Err(Error::InitError(format!(
            "Metadata store not found: {}",
            db_path.display()
        )));
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let missing = schema::missing_tables(&conn)?;
    if !missing.is_empty() {
        return Err(Error::InitError(format!(
            "Metadata store {} is missing tables: {}",
            db_path.display(),
            missing.join(", ")
        )));
    }

    debug!("Opened metadata store {} (read-only)", db_path.display());
    Ok(conn)
}

/// Create a new, empty metadata store
///
/// Used to build fixture stores; the export itself only ever calls `open`.
pub fn init(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    schema::create(&conn)?;

    info!("Initialized metadata store at {}", db_path.display());
    Ok(conn)
}
