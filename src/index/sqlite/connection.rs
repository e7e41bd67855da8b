//! Connection management for SqliteIndex.

use super::SqliteIndex;
use super::transaction::Transaction;
use crate::domain::IdGenerator;
use crate::index::{IndexError, IndexResult, create_schema};
use crate::infra::Vault;
use log::debug;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

impl SqliteIndex {
    // ===========================================
    // In-Memory Connection
    // ===========================================

    /// Opens an in-memory index. Useful for tests and throwaway indexes.
    pub fn open_in_memory(vault: Vault) -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, vault)
    }

    // ===========================================
    // File-Based Connection
    // ===========================================

    /// Opens or creates the index database at `path`.
    ///
    /// Creates parent directories if needed, switches the journal to WAL and
    /// brings the schema up to date.
    pub fn open(path: &Path, vault: Vault) -> IndexResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| IndexError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(
            "event=index_opened path={} journal_mode={}",
            path.display(),
            mode
        );
        Self::init(conn, vault)
    }

    fn init(mut conn: Connection, vault: Vault) -> IndexResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        create_schema(&mut conn)?;
        Ok(Self {
            conn,
            vault,
            ids: IdGenerator::new(),
        })
    }

    // ===========================================
    // Accessors
    // ===========================================

    /// Returns a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// The note areas this index derives default paths from.
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    // ===========================================
    // Transaction Support
    // ===========================================

    /// Begins a write transaction that rolls back on drop unless committed.
    pub fn transaction(&self) -> IndexResult<Transaction<'_>> {
        Transaction::begin(&self.conn)
    }
}
