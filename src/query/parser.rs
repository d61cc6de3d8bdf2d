//! Read-only statement checking
//!
//! The gateway accepts ad-hoc SQL from remote callers and runs it on a
//! read-only connection. Before that, text that sqlparser recognizes must be
//! exactly one query with no data-modifying parts. SQLite syntax the parser
//! does not cover (`GLOB`, `INDEXED BY`, ...) is left for the engine to
//! accept or reject.
//!
//! # Example
//!
//! ```rust
//! use deck_db::query::QueryParser;
//!
//! let parser = QueryParser::new();
//! assert!(parser.check_read_only("SELECT * FROM articles LIMIT 5").is_ok());
//! assert!(parser.check_read_only("DELETE FROM articles").is_err());
//! assert!(parser.check_read_only("SELECT * FROM articles WHERE prod_name GLOB 'S*'").is_ok());
//! ```

use crate::error::{DeckError, Result};
use log::debug;
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

/// SQL query parser
#[derive(Debug)]
pub struct QueryParser {
    dialect: SQLiteDialect,
}

impl QueryParser {
    /// Create a new query parser
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Reject anything recognizably other than a single read statement
    ///
    /// Text sqlparser cannot parse passes; the read-only connection it
    /// runs on rejects writes, and the engine reports syntax errors.
    ///
    /// # Returns
    /// `Err(DeckError::QueryRejected)` for empty text, multiple statements,
    /// or a parsed statement other than a pure query
    pub fn check_read_only(&self, sql: &str) -> Result<()> {
        let statement = match Parser::parse_sql(&self.dialect, sql) {
            Ok(mut statements) if statements.len() == 1 => statements.remove(0),
            Ok(statements) => {
                return Err(DeckError::QueryRejected(format!(
                    "expected exactly one SQL statement, found {}",
                    statements.len()
                )))
            }
            Err(e) => {
                debug!("sqlparser could not parse query, deferring to the engine: {}", e);
                return Ok(());
            }
        };

        match statement {
            Statement::Query(query) if is_read_only(&query) => Ok(()),
            Statement::Query(_) => Err(DeckError::QueryRejected(
                "query contains a data-modifying clause".to_string(),
            )),
            other => Err(DeckError::QueryRejected(format!(
                "only read queries are allowed, got: {}",
                first_words(&other.to_string())
            ))),
        }
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_read_only(query: &Query) -> bool {
    let ctes_ok = query
        .with
        .as_ref()
        .map(|with| with.cte_tables.iter().all(|cte| is_read_only(&cte.query)))
        .unwrap_or(true);
    ctes_ok && is_read_only_body(&query.body)
}

fn is_read_only_body(body: &SetExpr) -> bool {
    match body {
        // SELECT ... INTO creates a table
        SetExpr::Select(select) => select.into.is_none(),
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        SetExpr::Query(query) => is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_body(left) && is_read_only_body(right)
        }
        _ => false,
    }
}

fn first_words(statement: &str) -> String {
    statement.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}
