//! Core storage for the wardbook hospital dashboard.
//! Collection-scoped CRUD over a local SQLite file with generated ids and
//! audit timestamps.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::collection::{CollectionName, CollectionNameError, DOCTOR, NURSE, PATIENT};
pub use model::stored_object::{shallow_merge, ObjectId, Payload, StoredObject};
pub use repo::object_repo::{ListOptions, ObjectRepository, SqliteObjectRepository};
pub use service::hospital_service::{
    AreaSummary, HospitalService, HospitalStats, PatientStats, StaffKind, StaffStats,
};
pub use store::{parse_object_id, LazyObjectStore, ObjectStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
