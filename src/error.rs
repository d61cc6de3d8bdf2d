//! Error types
//!
//! All fallible operations in deck_db return [`Result`], whose error side is
//! [`DeckError`]. Missing per-table artifacts during a load are *not* errors;
//! they are reported as [`crate::database::LoadWarning`] values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DeckError>;

/// Errors raised by the schema tooling, the loader and the query gateway
#[derive(Debug, Error)]
pub enum DeckError {
    /// Schema file extension is neither JSON nor YAML
    #[error("unsupported schema format for {}: expected .json, .yaml or .yml", path.display())]
    UnsupportedFormat {
        /// Offending path
        path: PathBuf,
    },

    /// Schema failed validation before DDL emission
    #[error("invalid schema for table '{table}': {reason}")]
    SchemaValidation {
        /// Table the schema describes
        table: String,
        /// What was wrong
        reason: String,
    },

    /// Foreign keys form a cycle, so no load order exists
    #[error("cyclic foreign key dependency among tables: {}", tables.join(", "))]
    CyclicDependency {
        /// Tables left unresolved by the topological sort
        tables: Vec<String>,
    },

    /// The database rejected a DDL or insert statement, or could not be reached
    #[error("backend execution failed: {0}")]
    BackendExecution(#[from] sqlx::Error),

    /// The gateway refused to run a statement
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// The database rejected a gateway query
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Filesystem access failed
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A schema artifact could not be parsed or serialized
    #[error("failed to decode schema {}: {message}", path.display())]
    Decode {
        /// Schema artifact path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A columnar source file could not be read
    #[error("failed to read columnar file {}: {message}", path.display())]
    Columnar {
        /// Source file path
        path: PathBuf,
        /// Reader message
        message: String,
    },

    /// A configuration value is invalid
    #[error("invalid config key '{key}': {message}")]
    Config {
        /// Environment variable or setting name
        key: String,
        /// What was wrong with the value
        message: String,
    },
}

impl DeckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeckError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_schema(table: &str, reason: impl Into<String>) -> Self {
        DeckError::SchemaValidation {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the query category surfaced to gateway callers
    pub fn is_query_error(&self) -> bool {
        matches!(self, DeckError::Query(_) | DeckError::QueryRejected(_))
    }
}
