//! SQLite-backed zettel index.

mod connection;
mod repo_impl;
mod rows;
mod transaction;


use crate::domain::IdGenerator;
use crate::infra::Vault;
use rusqlite::Connection;

pub use transaction::Transaction;

// ===========================================
// SqliteIndex Struct
// ===========================================

/// SQLite-backed zettel index.
///
/// Owns the connection, the note areas used to fill in default paths, and
/// the id generator used for notes saved without an id.
pub struct SqliteIndex {
    pub(crate) conn: Connection,
    pub(crate) vault: Vault,
    pub(crate) ids: IdGenerator,
}
