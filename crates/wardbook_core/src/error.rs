//! Store-level error taxonomy.
//!
//! `NotFound` is an expected outcome, `StorageFailure` wraps anything the
//! persistence layer rejected, and `InvalidArgument` is raised before any
//! persistence attempt.

use crate::db::DbError;
use crate::model::collection::{CollectionName, CollectionNameError};
use crate::model::stored_object::ObjectId;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {collection}/{object_id}")]
    NotFound {
        collection: CollectionName,
        object_id: ObjectId,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] DbError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::StorageFailure(_) => "storage_failure",
        }
    }
}

impl From<CollectionNameError> for StoreError {
    fn from(value: CollectionNameError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageFailure(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::StorageFailure(DbError::Serialization(value))
    }
}
