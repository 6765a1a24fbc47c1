//! Store connection configuration.
//!
//! # Responsibility
//! - Load connection parameters from code, JSON or process environment.
//! - Parse ADO-style connection strings into a concrete SQLite target.
//!
//! # Invariants
//! - Absent or malformed configuration is an error, never a silent default.
//! - Connection string keys are matched case-insensitively.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable holding the connection string.
pub const CONNECTION_STRING_ENV: &str = "CATALOG_CONNECTION_STRING";
/// Optional environment override for the SQLite busy timeout.
pub const BUSY_TIMEOUT_ENV: &str = "CATALOG_BUSY_TIMEOUT_MS";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const MEMORY_DATA_SOURCE: &str = ":memory:";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Malformed(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing configuration value `{key}`"),
            Self::Malformed(message) => write!(f, "malformed configuration: {message}"),
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid config JSON: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Missing(_) | Self::Malformed(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    File(PathBuf),
    Memory,
}

/// Optional file logging settings carried alongside the connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    pub level: String,
    /// Absolute directory for rolling log files.
    pub dir: String,
}

/// Connection configuration for a catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// e.g. `Data Source=catalog.db` or `Data Source=:memory:`.
    pub connection_string: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub log: Option<LogSettings>,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl StoreConfig {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log: None,
        }
    }

    /// Config for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(format!("Data Source={MEMORY_DATA_SOURCE}"))
    }

    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.target()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Reads `CATALOG_CONNECTION_STRING` and `CATALOG_BUSY_TIMEOUT_MS`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from an environment-like lookup.
    ///
    /// # Errors
    /// - `Missing` when the connection string is unset or blank.
    /// - `Malformed` when the timeout is not an integer or the connection
    ///   string cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let connection_string = lookup(CONNECTION_STRING_ENV)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .ok_or(ConfigError::Missing(CONNECTION_STRING_ENV))?;

        let mut config = Self::new(connection_string);
        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            config.busy_timeout_ms = raw.trim().parse().map_err(|_| {
                ConfigError::Malformed(format!("{BUSY_TIMEOUT_ENV} must be an integer, got `{raw}`"))
            })?;
        }

        config.target()?;
        Ok(config)
    }

    /// Parses the connection string into a database target.
    ///
    /// Accepts `;`-separated `key=value` pairs. Recognized keys are
    /// `Data Source`, `DataSource`, `Filename` and `Mode` (only `Memory`
    /// changes the target).
    pub fn target(&self) -> ConfigResult<DbTarget> {
        parse_connection_string(&self.connection_string)
    }
}

fn parse_connection_string(raw: &str) -> ConfigResult<DbTarget> {
    let mut data_source: Option<String> = None;
    let mut memory_mode = false;

    for segment in raw.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let (key, value) = segment.split_once('=').ok_or_else(|| {
            ConfigError::Malformed(format!("connection string segment `{segment}` has no `=`"))
        })?;
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "data source" | "datasource" | "filename" => {
                if value.is_empty() {
                    return Err(ConfigError::Malformed(
                        "connection string data source cannot be empty".to_string(),
                    ));
                }
                if data_source.replace(value.to_string()).is_some() {
                    return Err(ConfigError::Malformed(
                        "connection string sets the data source more than once".to_string(),
                    ));
                }
            }
            "mode" => match value.to_ascii_lowercase().as_str() {
                "memory" => memory_mode = true,
                "readwrite" | "readwritecreate" => {}
                other => {
                    return Err(ConfigError::Malformed(format!(
                        "unsupported connection mode `{other}`"
                    )));
                }
            },
            other => {
                return Err(ConfigError::Malformed(format!(
                    "unknown connection string key `{other}`"
                )));
            }
        }
    }

    if memory_mode {
        return Ok(DbTarget::Memory);
    }

    match data_source {
        Some(source) if source == MEMORY_DATA_SOURCE => Ok(DbTarget::Memory),
        Some(source) => Ok(DbTarget::File(PathBuf::from(source))),
        None => Err(ConfigError::Missing("Data Source")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, DbTarget, StoreConfig, BUSY_TIMEOUT_ENV, CONNECTION_STRING_ENV,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_file_data_source() {
        let config = StoreConfig::new("Data Source=/var/lib/catalog/catalog.db");
        assert_eq!(
            config.target().unwrap(),
            DbTarget::File(PathBuf::from("/var/lib/catalog/catalog.db"))
        );
    }

    #[test]
    fn keys_are_case_insensitive_and_whitespace_tolerant() {
        let config = StoreConfig::new(" filename = app.db ; MODE=ReadWriteCreate; ");
        assert_eq!(config.target().unwrap(), DbTarget::File(PathBuf::from("app.db")));
    }

    #[test]
    fn memory_targets_are_recognized() {
        assert_eq!(StoreConfig::in_memory().target().unwrap(), DbTarget::Memory);
        assert_eq!(
            StoreConfig::new("Data Source=shared;Mode=Memory").target().unwrap(),
            DbTarget::Memory
        );
    }

    #[test]
    fn malformed_connection_strings_are_rejected() {
        for raw in [
            "catalog.db",
            "Server=localhost",
            "Data Source=",
            "Data Source=a.db;Data Source=b.db",
            "Data Source=a.db;Mode=ReadOnlyish",
        ] {
            let err = StoreConfig::new(raw).target().unwrap_err();
            assert!(
                matches!(err, ConfigError::Malformed(_)),
                "`{raw}` should be malformed, got {err}"
            );
        }
    }

    #[test]
    fn missing_data_source_is_reported() {
        let err = StoreConfig::new("Mode=ReadWrite").target().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("Data Source")));
    }

    #[test]
    fn lookup_requires_connection_string() {
        let err = StoreConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(key) if key == CONNECTION_STRING_ENV));

        let err = StoreConfig::from_lookup(lookup_from(&[(CONNECTION_STRING_ENV, "   ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn lookup_reads_busy_timeout_override() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (CONNECTION_STRING_ENV, "Data Source=:memory:"),
            (BUSY_TIMEOUT_ENV, "250"),
        ]))
        .unwrap();
        assert_eq!(config.busy_timeout_ms, 250);

        let err = StoreConfig::from_lookup(lookup_from(&[
            (CONNECTION_STRING_ENV, "Data Source=:memory:"),
            (BUSY_TIMEOUT_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(BUSY_TIMEOUT_ENV));
    }

    #[test]
    fn json_config_applies_defaults_and_rejects_unknown_fields() {
        let config =
            StoreConfig::from_json_str(r#"{"connection_string": "Data Source=:memory:"}"#).unwrap();
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.log, None);

        let err = StoreConfig::from_json_str(
            r#"{"connection_string": "Data Source=:memory:", "pool_size": 4}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));

        let err = StoreConfig::from_json_str(r#"{"connection_string": "nonsense"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }
}
