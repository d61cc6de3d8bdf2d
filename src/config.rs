//! Runtime configuration
//!
//! [`Config`] is built once (from defaults, the environment, then CLI flags)
//! and handed to the orchestrator and the gateway explicitly.
//!
//! # Example
//!
//! ```rust
//! use deck_db::config::{Config, DEFAULT_DATA_DIR};
//!
//! let config = Config::default();
//! assert_eq!(config.data_dir.to_str(), Some(DEFAULT_DATA_DIR));
//! assert!(config.load_order.is_none());
//! ```

use crate::error::{DeckError, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Database used when nothing else is configured
pub const DEFAULT_DATABASE_URL: &str = "sqlite://mcp_deck.db";

/// Directory holding one columnar file per table
pub const DEFAULT_DATA_DIR: &str = "data";

/// Directory holding one schema artifact per table
pub const DEFAULT_SCHEMA_DIR: &str = "schemas";

/// Address the tool server binds to
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";

/// Tables whose source file does not follow `<table>.parquet`
pub const DEFAULT_DATA_FILE_OVERRIDES: [(&str, &str); 1] = [("articles", "articles_clean.parquet")];

/// Extension of columnar source files
pub const DATA_FILE_EXTENSION: &str = "parquet";

/// Loader, gateway and server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Connection string of the database
    pub database_url: String,

    /// Directory of columnar source files
    pub data_dir: PathBuf,

    /// Directory of schema artifacts
    pub schema_dir: PathBuf,

    /// Tool server bind address
    pub server_addr: SocketAddr,

    /// Declared load order; `None` derives it from foreign keys
    pub load_order: Option<Vec<String>>,

    /// Source file name per table, for tables not using `<table>.parquet`
    pub data_file_overrides: HashMap<String, String>,

    /// Backend table options appended to generated DDL
    pub ddl_trailer: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            schema_dir: PathBuf::from(DEFAULT_SCHEMA_DIR),
            server_addr: DEFAULT_SERVER_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080))),
            load_order: None,
            data_file_overrides: DEFAULT_DATA_FILE_OVERRIDES
                .iter()
                .map(|(table, file)| (table.to_string(), file.to_string()))
                .collect(),
            ddl_trailer: None,
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment
    ///
    /// Reads `DATABASE_URL`, `DATABASE_PATH`, `DATA_DIR`, `SCHEMA_DIR`,
    /// `SERVER_ADDR` and `LOAD_ORDER`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// `DATABASE_URL` wins over `DATABASE_PATH` when both are set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = get("DATABASE_PATH") {
            config.database_url = sqlite_url(Path::new(&path));
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(dir) = get("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("SCHEMA_DIR") {
            config.schema_dir = PathBuf::from(dir);
        }
        if let Some(addr) = get("SERVER_ADDR") {
            config.server_addr = addr.parse().map_err(|e| DeckError::Config {
                key: "SERVER_ADDR".to_string(),
                message: format!("'{}': {}", addr, e),
            })?;
        }
        if let Some(order) = get("LOAD_ORDER") {
            config.load_order = Some(parse_table_list("LOAD_ORDER", &order)?);
        }

        Ok(config)
    }

    /// Source file for a table, honoring overrides
    pub fn data_file(&self, table: &str) -> PathBuf {
        let file = self
            .data_file_overrides
            .get(table)
            .cloned()
            .unwrap_or_else(|| format!("{}.{}", table, DATA_FILE_EXTENSION));
        self.data_dir.join(file)
    }
}

/// `sqlite://` URL for a database file path
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

/// Parse a comma-separated table list
pub fn parse_table_list(key: &str, value: &str) -> Result<Vec<String>> {
    let tables: Vec<String> = value
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tables.is_empty() {
        return Err(DeckError::Config {
            key: key.to_string(),
            message: "expected a comma-separated list of tables".to_string(),
        });
    }
    Ok(tables)
}
