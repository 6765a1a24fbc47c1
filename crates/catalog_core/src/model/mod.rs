//! Catalog domain model.
//!
//! # Responsibility
//! - Define the record shapes persisted by the catalog store.
//! - Attach field constraints as declarative metadata.
//!
//! # Invariants
//! - Identifiers are assigned by the store, never by callers.

pub mod product;
