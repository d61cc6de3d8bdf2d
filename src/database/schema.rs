//! Table schema model
//!
//! This module provides the portable description of one table: its ordered
//! columns, an optional primary key and its foreign keys. A schema is
//! engine independent; [`crate::database::DdlGenerator`] turns it into SQL.
//!
//! # Example
//!
//! ```rust
//! use deck_db::database::{Column, ForeignKey, Schema, SqlType};
//!
//! let schema = Schema::new("orders")
//!     .with_column(Column::new("id", SqlType::BigInt, false))
//!     .with_column(Column::new("user_id", SqlType::BigInt, false))
//!     .with_primary_key("id")
//!     .with_foreign_key(ForeignKey::new("user_id", "users", "id"));
//!
//! assert!(schema.validate().is_ok());
//! ```

use crate::error::{DeckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// SQL column type
///
/// Known types render in canonical upper case. Any other type string read
/// from a schema artifact is kept verbatim in [`SqlType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SqlType {
    /// 64-bit integer
    BigInt,

    /// 32-bit integer
    Int,

    /// Double precision float
    Double,

    /// Single precision float
    Float,

    /// Boolean
    Boolean,

    /// Bounded string
    Varchar(u32),

    /// Unbounded text, the inference fallback
    Text,

    /// Date and time without zone
    DateTime,

    /// Engine-specific type kept as written
    Other(String),
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Int => write!(f, "INT"),
            SqlType::Double => write!(f, "DOUBLE"),
            SqlType::Float => write!(f, "FLOAT"),
            SqlType::Boolean => write!(f, "BOOLEAN"),
            SqlType::Varchar(len) => write!(f, "VARCHAR({})", len),
            SqlType::Text => write!(f, "TEXT"),
            SqlType::DateTime => write!(f, "DATETIME"),
            SqlType::Other(raw) => write!(f, "{}", raw),
        }
    }
}

impl FromStr for SqlType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let parsed = match normalized.as_str() {
            "BIGINT" => SqlType::BigInt,
            "INT" => SqlType::Int,
            "DOUBLE" => SqlType::Double,
            "FLOAT" => SqlType::Float,
            "BOOLEAN" => SqlType::Boolean,
            "TEXT" => SqlType::Text,
            "DATETIME" => SqlType::DateTime,
            other => other
                .strip_prefix("VARCHAR(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|len| len.trim().parse().ok())
                .map(SqlType::Varchar)
                .unwrap_or_else(|| SqlType::Other(s.trim().to_string())),
        };
        Ok(parsed)
    }
}

impl From<String> for SqlType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<SqlType> for String {
    fn from(value: SqlType) -> Self {
        value.to_string()
    }
}

fn default_nullable() -> bool {
    true
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// SQL type
    #[serde(rename = "type")]
    pub sql_type: SqlType,

    /// Whether NULL is allowed; artifacts that omit it are nullable
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable,
        }
    }
}

/// Target of a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Referenced table
    pub table: String,

    /// Referenced column
    pub column: String,
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referencing column in this table
    pub column: String,

    /// Referenced table and column
    pub references: Reference,
}

impl ForeignKey {
    /// Create a new foreign key
    pub fn new(
        column: impl Into<String>,
        table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references: Reference {
                table: table.into(),
                column: referenced_column.into(),
            },
        }
    }
}

/// Parses the command-line form `column=table.column`
impl FromStr for ForeignKey {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DeckError::Config {
            key: "fkeys".to_string(),
            message: format!("expected column=table.column, got '{}'", s),
        };
        let (column, target) = s.split_once('=').ok_or_else(invalid)?;
        let (table, referenced) = target.split_once('.').ok_or_else(invalid)?;
        if [column, table, referenced].iter().any(|part| part.trim().is_empty()) {
            return Err(invalid());
        }
        Ok(ForeignKey::new(column.trim(), table.trim(), referenced.trim()))
    }
}

/// Table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Table name
    pub table_name: String,

    /// Column definitions, in declaration order
    pub columns: Vec<Column>,

    /// Primary key column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,

    /// Foreign keys, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Create a schema with no columns or keys
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    /// Append a column
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Append a foreign key
    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Tables this schema references through foreign keys
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references.table.as_str())
    }

    /// Validate the schema
    ///
    /// Checks identifier safety, column uniqueness, and that the primary key
    /// and every foreign key column name an existing column. Whether the
    /// referenced table exists is left to the database.
    pub fn validate(&self) -> Result<()> {
        let table = self.table_name.as_str();
        check_identifier(table, table)?;

        if self.columns.is_empty() {
            return Err(DeckError::invalid_schema(table, "table has no columns"));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            check_identifier(table, &column.name)?;
            if !seen.insert(column.name.as_str()) {
                return Err(DeckError::invalid_schema(
                    table,
                    format!("duplicate column '{}'", column.name),
                ));
            }
        }

        if let Some(pk) = &self.primary_key {
            if self.get_column(pk).is_none() {
                return Err(DeckError::invalid_schema(
                    table,
                    format!("primary key '{}' is not a column", pk),
                ));
            }
        }

        for fk in &self.foreign_keys {
            if self.get_column(&fk.column).is_none() {
                return Err(DeckError::invalid_schema(
                    table,
                    format!("foreign key column '{}' is not a column", fk.column),
                ));
            }
            check_identifier(table, &fk.references.table)?;
            check_identifier(table, &fk.references.column)?;
        }

        Ok(())
    }
}

/// Whether `name` is a bare SQL identifier: ASCII letter or underscore,
/// then letters, digits or underscores
pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(table: &str, name: &str) -> Result<()> {
    if is_safe_identifier(name) {
        Ok(())
    } else {
        Err(DeckError::invalid_schema(
            table,
            format!("'{}' is not a valid identifier", name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Schema {
        Schema::new("orders")
            .with_column(Column::new("id", SqlType::BigInt, false))
            .with_column(Column::new("user_id", SqlType::BigInt, false))
            .with_primary_key("id")
            .with_foreign_key(ForeignKey::new("user_id", "users", "id"))
    }

    #[test]
    fn test_sql_type_parse_and_display() {
        assert_eq!("bigint".parse::<SqlType>().unwrap(), SqlType::BigInt);
        assert_eq!("VARCHAR(255)".parse::<SqlType>().unwrap(), SqlType::Varchar(255));
        assert_eq!(SqlType::Varchar(64).to_string(), "VARCHAR(64)");
        assert_eq!(
            "DECIMAL(10,2)".parse::<SqlType>().unwrap(),
            SqlType::Other("DECIMAL(10,2)".to_string())
        );
        assert_eq!(SqlType::Other("JSONB".to_string()).to_string(), "JSONB");
    }

    #[test]
    fn test_schema_validate() {
        assert!(orders().validate().is_ok());
    }

    #[test]
    fn test_schema_rejects_duplicate_column() {
        let schema = orders().with_column(Column::new("id", SqlType::Int, true));
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate column 'id'"));
    }

    #[test]
    fn test_schema_rejects_dangling_keys() {
        let mut schema = orders();
        schema.primary_key = Some("missing".to_string());
        assert!(matches!(
            schema.validate(),
            Err(DeckError::SchemaValidation { .. })
        ));

        let schema = orders().with_foreign_key(ForeignKey::new("ghost", "users", "id"));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_schema_rejects_unsafe_identifiers() {
        let schema = Schema::new("orders; DROP TABLE users")
            .with_column(Column::new("id", SqlType::BigInt, false));
        assert!(schema.validate().is_err());

        let schema = Schema::new("orders").with_column(Column::new("1st", SqlType::Int, true));
        assert!(schema.validate().is_err());

        let schema = Schema::new("orders").with_column(Column::new("id", SqlType::Int, true));
        assert!(schema.validate().is_ok());
        assert!(Schema::new("orders").validate().is_err());
    }

    #[test]
    fn test_is_safe_identifier() {
        assert!(is_safe_identifier("t_dat"));
        assert!(is_safe_identifier("_hidden2"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("user id"));
        assert!(!is_safe_identifier("name\""));
    }

    #[test]
    fn test_foreign_key_from_str() {
        let fk: ForeignKey = "customer_id=customers.customer_id".parse().unwrap();
        assert_eq!(fk, ForeignKey::new("customer_id", "customers", "customer_id"));

        assert!("customer_id".parse::<ForeignKey>().is_err());
        assert!("customer_id=customers".parse::<ForeignKey>().is_err());
        assert!("=customers.id".parse::<ForeignKey>().is_err());
    }

    #[test]
    fn test_nullable_defaults_to_true() {
        let column: Column = serde_json::from_str(r#"{"name": "x", "type": "TEXT"}"#).unwrap();
        assert!(column.nullable);
        assert_eq!(column.sql_type, SqlType::Text);
    }
}
