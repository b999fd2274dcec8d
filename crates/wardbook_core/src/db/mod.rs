//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing the object store.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No collection data is read or written before migrations succeed.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

/// Persistence-layer failure. Surfaced to store callers as `StorageFailure`.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted row could not be decoded into a record.
    #[error("invalid persisted object data: {0}")]
    CorruptRecord(String),

    /// The blocking task running a storage call panicked or was cancelled.
    #[error("storage task did not complete: {0}")]
    TaskAborted(String),
}
