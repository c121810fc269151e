//! SQLite store utilities.
//!
//! Connections are opened with:
//! - `journal_mode = WAL` so readers do not block the single writer
//! - `busy_timeout = 5s` to absorb transient lock contention
//! - `foreign_keys = ON`, which the cascade and set-null rules depend on

pub mod migrations;
pub mod query;
pub mod schema;
pub mod write;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Directory holding the store and project config.
pub const STORE_DIR: &str = ".alog";

/// Database file name inside [`STORE_DIR`].
pub const DB_FILE: &str = "alog.db";

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the store database for a project rooted at `root`.
#[must_use]
pub fn store_path(root: &Path) -> PathBuf {
    root.join(STORE_DIR).join(DB_FILE)
}

/// Open (or create) the store, apply runtime pragmas, and migrate the
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening, configuring or migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open store database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// Open an in-memory store with the full schema. Used by tests and benches.
///
/// # Errors
///
/// Returns an error if migration fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory store")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(conn)
}

/// Open an existing store.
///
/// Returns `Ok(None)` when the file is missing or unreadable as a store, so
/// callers can report an uninitialized project instead of a raw SQLite
/// error.
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for I/O failures that
/// should not be masked.
pub fn try_open_store(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }

    match open_store(path) {
        Ok(conn) => {
            let readable = conn
                .query_row("SELECT schema_version FROM store_meta WHERE id = 1", [], |row| {
                    row.get::<_, i64>(0)
                })
                .is_ok();
            if readable {
                Ok(Some(conn))
            } else {
                tracing::warn!(path = %path.display(), "store database unreadable");
                Ok(None)
            }
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to open store database"
            );
            Ok(None)
        }
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
