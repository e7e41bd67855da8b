//! Relational index over the notes on disk.

mod memory;
mod repository;
mod schema;
mod sqlite;

pub use memory::MemoryIndex;
pub use repository::{HISTORY_LIMIT, IndexError, IndexResult, ZettelRepository};
pub use schema::{SCHEMA_VERSION, create_schema, schema_version};
pub use sqlite::{SqliteIndex, Transaction};
