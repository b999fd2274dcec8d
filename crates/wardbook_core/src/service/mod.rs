//! Use-case services built on the object store.
//!
//! Services only call the store's public operations; filtering happens after
//! fetching, on top-level payload fields.

pub mod hospital_service;
