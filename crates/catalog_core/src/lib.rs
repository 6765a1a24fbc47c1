//! Product catalog data-access layer.
//! Owns the product record, its field rules and the SQLite-backed collection.

pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, DbTarget, LogSettings, StoreConfig};
pub use context::{CatalogContext, ContextError};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::product::{FieldViolation, Product, ProductId, ProductValidationError};
pub use repo::product_repo::{
    ProductListQuery, ProductRepository, RepoError, RepoResult, SqliteProductRepository,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
