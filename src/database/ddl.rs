//! DDL generation
//!
//! Compiles a [`Schema`] into a single `CREATE TABLE` statement: one line per
//! column in declaration order, then the primary key clause, then one clause
//! per foreign key.
//!
//! # Example
//!
//! ```rust
//! use deck_db::database::{Column, DdlGenerator, Schema, SqlType};
//!
//! let schema = Schema::new("customers")
//!     .with_column(Column::new("customer_id", SqlType::Text, false))
//!     .with_primary_key("customer_id");
//!
//! let sql = DdlGenerator::new().generate(&schema)?;
//! assert_eq!(
//!     sql,
//!     "CREATE TABLE customers (\n  customer_id TEXT NOT NULL,\n  PRIMARY KEY (customer_id)\n);"
//! );
//! # Ok::<(), deck_db::DeckError>(())
//! ```

use crate::database::schema::Schema;
use crate::error::Result;

/// Table options appended by MySQL-flavoured output
pub const MYSQL_TABLE_TRAILER: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

/// `CREATE TABLE` generator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdlGenerator {
    /// Backend-specific table options placed after the closing parenthesis
    trailer: Option<String>,
}

impl DdlGenerator {
    /// Create a generator producing portable DDL
    pub fn new() -> Self {
        Self { trailer: None }
    }

    /// Create a generator that appends `trailer` after the column block
    pub fn with_trailer(trailer: impl Into<String>) -> Self {
        let trailer = trailer.into();
        Self {
            trailer: if trailer.trim().is_empty() {
                None
            } else {
                Some(trailer)
            },
        }
    }

    /// Generate the `CREATE TABLE` statement for a schema
    ///
    /// # Returns
    /// `Err(DeckError::SchemaValidation)` if the schema does not validate;
    /// identifiers are emitted unquoted, so only safe names get through
    pub fn generate(&self, schema: &Schema) -> Result<String> {
        schema.validate()?;

        let mut clauses: Vec<String> = schema
            .columns
            .iter()
            .map(|col| {
                let null = if col.nullable { "NULL" } else { "NOT NULL" };
                format!("  {} {} {}", col.name, col.sql_type, null)
            })
            .collect();

        if let Some(pk) = &schema.primary_key {
            clauses.push(format!("  PRIMARY KEY ({})", pk));
        }

        for fk in &schema.foreign_keys {
            clauses.push(format!(
                "  FOREIGN KEY ({}) REFERENCES {}({})",
                fk.column, fk.references.table, fk.references.column
            ));
        }

        let trailer = match &self.trailer {
            Some(trailer) => format!(" {}", trailer),
            None => String::new(),
        };

        Ok(format!(
            "CREATE TABLE {} (\n{}\n){};",
            schema.table_name,
            clauses.join(",\n"),
            trailer
        ))
    }

    /// `DROP TABLE IF EXISTS` statement for a table
    pub fn drop_table(table: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", table)
    }
}
