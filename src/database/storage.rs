//! Schema artifact storage
//!
//! This module persists table schemas to disk and loads them back. The file
//! extension selects the format: `.json` for machine interchange, `.yaml` or
//! `.yml` for hand editing. Both formats keep column order and omit absent
//! primary/foreign keys.
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::database::{Column, Schema, SchemaStorage, SqlType};
//! use std::path::Path;
//!
//! let schema = Schema::new("customers").with_column(Column::new("customer_id", SqlType::Text, false));
//!
//! let storage = SchemaStorage::new();
//! storage.save(&schema, Path::new("schemas/customers.yaml"))?;
//! let loaded = storage.load(Path::new("schemas/customers.yaml"))?;
//! assert_eq!(schema, loaded);
//! # Ok::<(), deck_db::DeckError>(())
//! ```

use crate::database::schema::Schema;
use crate::error::{DeckError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Schema artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Pretty-printed JSON
    Json,

    /// YAML
    Yaml,
}

impl SchemaFormat {
    /// Extensions probed when looking up a table's schema, in priority order
    pub const EXTENSIONS: [&'static str; 3] = ["json", "yaml", "yml"];

    /// Select the format from a path's extension (case-insensitive)
    ///
    /// # Returns
    /// `Err(DeckError::UnsupportedFormat)` for any other extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(SchemaFormat::Json),
            Some("yaml") | Some("yml") => Ok(SchemaFormat::Yaml),
            _ => Err(DeckError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Serialize a schema to text
    pub fn encode(&self, schema: &Schema) -> std::result::Result<String, String> {
        match self {
            SchemaFormat::Json => serde_json::to_string_pretty(schema)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| e.to_string()),
            SchemaFormat::Yaml => serde_yaml::to_string(schema).map_err(|e| e.to_string()),
        }
    }

    /// Parse a schema from text
    pub fn decode(&self, text: &str) -> std::result::Result<Schema, String> {
        match self {
            SchemaFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            SchemaFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Schema storage
///
/// Provides methods for saving and loading schema artifacts.
#[derive(Debug, Clone, Default)]
pub struct SchemaStorage;

impl SchemaStorage {
    /// Create a new schema storage instance
    pub fn new() -> Self {
        Self
    }

    /// Save a schema to a file
    ///
    /// # Arguments
    /// * `schema` - Schema to save
    /// * `path` - Destination; its extension selects the format
    pub fn save(&self, schema: &Schema, path: &Path) -> Result<()> {
        let format = SchemaFormat::from_path(path)?;
        let text = format.encode(schema).map_err(|message| DeckError::Decode {
            path: path.to_path_buf(),
            message,
        })?;
        fs::write(path, text).map_err(|e| DeckError::io(path, e))
    }

    /// Load a schema from a file
    ///
    /// The schema is returned as written; validation happens at DDL time.
    pub fn load(&self, path: &Path) -> Result<Schema> {
        let format = SchemaFormat::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|e| DeckError::io(path, e))?;
        format.decode(&text).map_err(|message| DeckError::Decode {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Locate the schema artifact for a table in a directory
    ///
    /// Probes `<table>.json`, `<table>.yaml` then `<table>.yml`.
    pub fn find(&self, dir: &Path, table: &str) -> Option<PathBuf> {
        SchemaFormat::EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", table, ext)))
            .find(|candidate| candidate.is_file())
    }

    /// Load every schema artifact in a directory, sorted by file name
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<Schema>> {
        let entries = fs::read_dir(dir).map_err(|e| DeckError::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| DeckError::io(dir, e))?.path();
            if path.is_file() && SchemaFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(|path| self.load(path)).collect()
    }

    /// Write generated DDL to a file, followed by a newline
    pub fn save_sql(&self, sql: &str, path: &Path) -> Result<()> {
        fs::write(path, format!("{}\n", sql)).map_err(|e| DeckError::io(path, e))
    }
}
