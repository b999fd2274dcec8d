//! Collection names.
//!
//! A collection is an independent namespace of records. Names are validated
//! before any persistence attempt so malformed input surfaces as
//! `InvalidArgument` instead of a storage error.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Collection holding patient records.
pub const PATIENT: &str = "patient";
/// Collection holding doctor records.
pub const DOCTOR: &str = "doctor";
/// Collection holding nurse records.
pub const NURSE: &str = "nurse";

/// Collections registered by the initial schema migration.
pub const DEFAULT_COLLECTIONS: &[&str] = &[PATIENT, DOCTOR, NURSE];

const MAX_COLLECTION_NAME_CHARS: usize = 64;

/// Rejection reasons for a collection name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionNameError {
    #[error("collection name must not be empty")]
    Empty,
    #[error("collection name exceeds {} characters", MAX_COLLECTION_NAME_CHARS)]
    TooLong,
    #[error("collection name `{0}` may only contain a-z, 0-9, `_` and `-`")]
    InvalidCharacters(String),
}

/// Validated collection name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: impl Into<String>) -> Result<Self, CollectionNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CollectionNameError::Empty);
        }
        if name.chars().count() > MAX_COLLECTION_NAME_CHARS {
            return Err(CollectionNameError::TooLong);
        }
        let valid = name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-');
        if !valid {
            return Err(CollectionNameError::InvalidCharacters(name));
        }
        Ok(Self(name))
    }

    pub fn patient() -> Self {
        Self(PATIENT.to_string())
    }

    pub fn doctor() -> Self {
        Self(DOCTOR.to_string())
    }

    pub fn nurse() -> Self {
        Self(NURSE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CollectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CollectionName {
    type Err = CollectionNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = CollectionNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CollectionName {
    type Error = CollectionNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollectionName> for String {
    fn from(value: CollectionName) -> Self {
        value.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
