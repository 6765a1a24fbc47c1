//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the product collection contract used by request handlers.
//! - Isolate SQLite query details from callers.
//!
//! # Invariants
//! - Repository writes enforce `Product::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `MissingId`) in
//!   addition to DB transport errors.

pub mod product_repo;
