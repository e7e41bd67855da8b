//! Write transactions with rollback on drop.

use crate::index::IndexResult;
use rusqlite::{CachedStatement, Connection};

/// An `IMMEDIATE` write transaction.
///
/// Takes the write lock up front so concurrent writers wait on the busy
/// timeout instead of failing mid-batch. Rolls back when dropped unless
/// `commit()` was called.
pub struct Transaction<'a> {
    conn: &'a Connection,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(conn: &'a Connection) -> IndexResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    /// A cached prepared statement, reused across rows of a batch.
    pub(crate) fn prepare(&self, sql: &str) -> IndexResult<CachedStatement<'a>> {
        Ok(self.conn.prepare_cached(sql)?)
    }

    /// Commits the transaction.
    pub fn commit(mut self) -> IndexResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            // nothing to report from drop
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}
