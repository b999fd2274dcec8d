//! Record model for the collection-scoped object store.
//!
//! # Invariants
//! - Every record is identified by a generated `ObjectId` within exactly one
//!   collection.
//! - Payload updates are shallow merges of top-level keys.

pub mod collection;
pub mod stored_object;
