pub mod sqlite;
pub mod store;

pub use sqlite::*;
pub use store::*;

use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Shared connection handle. Mutating engine paths hold the lock for the
/// whole read-modify-write so per-plan edits never interleave.
pub type Db = Arc<Mutex<rusqlite::Connection>>;

/// Wrap a freshly opened connection for sharing across engine components.
pub fn shared(conn: rusqlite::Connection) -> Db {
    Arc::new(Mutex::new(conn))
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}
