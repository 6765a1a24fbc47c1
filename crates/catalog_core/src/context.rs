//! Catalog database context.
//!
//! # Responsibility
//! - Turn connection configuration into an open, migrated, verified store.
//! - Hand out the product collection handle.
//!
//! # Invariants
//! - A constructed context always carries the current product schema.
//! - The context holds no business logic; every query lives in the repository.

use crate::config::{ConfigError, StoreConfig};
use crate::db::{open_target, DbError};
use crate::repo::product_repo::{RepoError, SqliteProductRepository};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug)]
pub enum ContextError {
    Config(ConfigError),
    Db(DbError),
    Repo(RepoError),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ContextError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for ContextError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ContextError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Single-owner handle to the catalog store.
///
/// Build one per request or unit of work; it owns its SQLite connection and
/// closes it on drop.
pub struct CatalogContext {
    conn: Connection,
}

impl CatalogContext {
    /// Opens the store described by `config`.
    ///
    /// # Errors
    /// - `Config` when the connection string is malformed.
    /// - `Db` when the database cannot be opened or migrated.
    /// - `Repo` when the opened database does not carry the product schema.
    pub fn connect(config: &StoreConfig) -> Result<Self, ContextError> {
        let target = config.target().map_err(|err| {
            error!(
                "event=context_connect module=context status=error error_code=config_invalid error={}",
                err
            );
            err
        })?;

        let conn = open_target(&target, Duration::from_millis(config.busy_timeout_ms))?;
        SqliteProductRepository::try_new(&conn)?;

        info!("event=context_connect module=context status=ok");
        Ok(Self { conn })
    }

    /// Connects using `CATALOG_CONNECTION_STRING` from the process environment.
    pub fn from_env() -> Result<Self, ContextError> {
        let config = StoreConfig::from_env()?;
        Self::connect(&config)
    }

    /// Returns the product collection.
    pub fn products(&self) -> SqliteProductRepository<'_> {
        SqliteProductRepository::new_unchecked(&self.conn)
    }

    /// Raw engine handle for callers needing SQLite features directly.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
