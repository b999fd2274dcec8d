//! Repository layer over the SQLite connection.
//!
//! # Responsibility
//! - Define the synchronous CRUD contract for collection-scoped records.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Repository APIs return semantic `NotFound` errors distinct from
//!   persistence failures.

pub mod object_repo;
