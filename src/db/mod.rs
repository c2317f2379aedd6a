//! The disposable SQLite index.
//!
//! This module provides the structured store derived from the text corpus:
//! entry rows, a full-text index over their content, and per-file content
//! hashes for incremental reindexing. The store owns no information that is
//! not derivable from the files plus the reference algorithm; deleting it
//! and running a full reindex always reconstructs it.
//!
//! # Module Structure
//!
//! - `schema`: Table definitions and schema initialization
//! - `entries`: Entry rows, lookups, filters, and full-text search
//! - `files`: Per-file content-hash records
//!
//! The `Database` handle is an explicit value opened at command start and
//! passed to every component that needs it; there is no module-level
//! connection singleton.

pub mod entries;
pub mod files;
pub mod schema;

use crate::errors::{AppResult, DatabaseError};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

/// Type alias for a pooled SQLite connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Handle on the SQLite index.
///
/// The index is local and single-writer; the pool exists so read helpers can
/// borrow connections independently, not for concurrent writes (those are
/// serialized by the store lock in [`crate::lock`]).
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens or creates the index database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the pool cannot be
    /// initialized.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        debug!("Opening index database at {:?}", db_path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(4)
            .connection_customizer(Box::new(PragmaConfig))
            .build(manager)
            .map_err(DatabaseError::Pool)?;

        Ok(Database { pool })
    }

    /// Opens an in-memory index. Test-only convenience.
    #[cfg(test)]
    pub fn open_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(PragmaConfig))
            .build(manager)
            .map_err(DatabaseError::Pool)?;
        Ok(Database { pool })
    }

    /// Gets a connection from the pool.
    pub fn get_conn(&self) -> AppResult<PooledConnection> {
        self.pool
            .get()
            .map_err(|e| DatabaseError::Pool(e).into())
    }

    /// Initializes the schema. Idempotent.
    pub fn initialize_schema(&self) -> AppResult<()> {
        let conn = self.get_conn()?;
        schema::create_tables(&conn)?;
        Ok(())
    }
}

/// Connection customizer applying standard pragmas on acquire.
#[derive(Debug)]
struct PragmaConfig;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaConfig {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Short timeout: contention should fail fast, not block silently.
        conn.pragma_update(None, "busy_timeout", 1000)?;
        Ok(())
    }

    fn on_release(&self, _conn: Connection) {}
}
