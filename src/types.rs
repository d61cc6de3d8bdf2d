//! Core types for loading and querying
//!
//! This module defines the data structures shared by the loader and the
//! query gateway:
//! - Materialized tables read from columnar files
//! - Tagged SQL values and rows
//! - Ordered query records

use crate::database::inference::NativeType;
use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// In-memory table materialized from a columnar source file
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name (usually the source file stem)
    pub name: String,

    /// Column descriptions, in file order
    pub columns: Vec<TableColumn>,

    /// Data rows
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: String, columns: Vec<TableColumn>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    /// Get number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Get number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names, in file order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Column of a materialized table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Column name
    pub name: String,

    /// Storage type reported by the source file
    pub native_type: NativeType,

    /// Number of nulls observed while materializing
    pub null_count: usize,
}

impl TableColumn {
    /// Create a new column with no observed nulls
    pub fn new(name: String, native_type: NativeType) -> Self {
        Self {
            name,
            native_type,
            null_count: 0,
        }
    }

    /// Whether the materialized data contains at least one null
    pub fn has_nulls(&self) -> bool {
        self.null_count > 0
    }
}

/// SQL value
///
/// Timestamps carry no time zone; zoned source values are normalized to UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Signed integer
    Integer(i64),

    /// Floating point number
    Float(f64),

    /// Text value
    Text(String),

    /// Boolean value
    Boolean(bool),

    /// Timestamp without zone
    Timestamp(NaiveDateTime),

    /// NULL value
    Null,
}

impl Value {
    /// Whether this is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

/// Database row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row values, positionally matching the table columns
    pub values: Vec<Value>,
}

impl Row {
    /// Create a new row
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get value at column index
    pub fn get_value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Query result record
///
/// An ordered mapping from column name to value. Serializes as a JSON object
/// whose keys keep the column order of the result set. Column names are
/// unique: a repeated name (e.g. `article_id` from both sides of a join)
/// is stored as `article_id_1`, `article_id_2`, ...
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` columns
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a column; column order is insertion order
    ///
    /// A name already present gets the first free `_<n>` suffix.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        let mut name = column.clone();
        let mut suffix = 0;
        while self.get(&name).is_some() {
            suffix += 1;
            name = format!("{}_{}", column, suffix);
        }
        self.fields.push((name, value));
    }

    /// Look up a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in result order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in result order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no columns
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
