//! Process configuration read from environment variables.
//!
//! | Variable                 | Values                       | Default        |
//! |--------------------------|------------------------------|----------------|
//! | `POSTER_REPOSITORY_TYPE` | `inmemory` \| `sqlite`       | `inmemory`     |
//! | `POSTER_DB_PATH`         | file path or `:memory:`      | required for sqlite |
//! | `POSTER_LOG_LEVEL`       | trace\|debug\|info\|warn\|error | build mode  |
//! | `POSTER_LOG_DIR`         | absolute directory           | logging off    |

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const REPOSITORY_TYPE_VAR: &str = "POSTER_REPOSITORY_TYPE";
pub const DB_PATH_VAR: &str = "POSTER_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "POSTER_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "POSTER_LOG_DIR";

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory,
    /// SQLite file, or a private in-memory database for `:memory:`.
    Sqlite(SqlitePath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlitePath {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub log_level: &'static str,
    /// Logging stays disabled when unset.
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownRepositoryType(String),
    MissingDbPath,
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRepositoryType(value) => write!(
                f,
                "{REPOSITORY_TYPE_VAR} must be `inmemory` or `sqlite`, got `{value}`"
            ),
            Self::MissingDbPath => write!(f, "{DB_PATH_VAR} is required for the sqlite store"),
            Self::InvalidLogLevel(value) => {
                write!(f, "{LOG_LEVEL_VAR} has unsupported value `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let store = match get(REPOSITORY_TYPE_VAR)
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("inmemory") => StoreConfig::InMemory,
            Some("sqlite") => match get(DB_PATH_VAR).as_deref() {
                None => return Err(ConfigError::MissingDbPath),
                Some(":memory:") => StoreConfig::Sqlite(SqlitePath::Memory),
                Some(path) => StoreConfig::Sqlite(SqlitePath::File(PathBuf::from(path))),
            },
            Some(other) => return Err(ConfigError::UnknownRepositoryType(other.to_string())),
        };

        let log_level = match get(LOG_LEVEL_VAR) {
            Some(value) => {
                normalize_level(&value).map_err(|_| ConfigError::InvalidLogLevel(value))?
            }
            None => default_log_level(),
        };

        Ok(Self {
            store,
            log_level,
            log_dir: get(LOG_DIR_VAR),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, SqlitePath, StoreConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_store_without_logging() {
        let config = config(&[]).unwrap();
        assert_eq!(config.store, StoreConfig::InMemory);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn sqlite_requires_a_path() {
        assert_eq!(
            config(&[("POSTER_REPOSITORY_TYPE", "sqlite")]),
            Err(ConfigError::MissingDbPath)
        );
        let file = config(&[
            ("POSTER_REPOSITORY_TYPE", "SQLite"),
            ("POSTER_DB_PATH", "/tmp/poster.db"),
        ])
        .unwrap();
        assert_eq!(
            file.store,
            StoreConfig::Sqlite(SqlitePath::File(PathBuf::from("/tmp/poster.db")))
        );
        let memory = config(&[
            ("POSTER_REPOSITORY_TYPE", "sqlite"),
            ("POSTER_DB_PATH", ":memory:"),
        ])
        .unwrap();
        assert_eq!(memory.store, StoreConfig::Sqlite(SqlitePath::Memory));
    }

    #[test]
    fn rejects_unknown_backend_and_level() {
        assert_eq!(
            config(&[("POSTER_REPOSITORY_TYPE", "postgres")]),
            Err(ConfigError::UnknownRepositoryType("postgres".to_string()))
        );
        assert_eq!(
            config(&[("POSTER_LOG_LEVEL", "chatty")]),
            Err(ConfigError::InvalidLogLevel("chatty".to_string()))
        );
        assert_eq!(
            config(&[("POSTER_LOG_LEVEL", "WARN")]).unwrap().log_level,
            "warn"
        );
    }
}
