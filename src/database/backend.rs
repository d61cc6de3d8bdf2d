//! Database backend
//!
//! The loader and the gateway talk to the database only through the
//! [`Backend`] trait: execute a statement, bulk-insert rows, fetch records.
//! [`SqliteBackend`] implements it on an sqlx connection pool.
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::database::{Backend, SqliteBackend};
//!
//! # async fn run() -> deck_db::Result<()> {
//! let backend = SqliteBackend::connect("sqlite://mcp_deck.db").await?;
//! backend.execute("DROP TABLE IF EXISTS transactions;").await?;
//! let records = backend.fetch("SELECT COUNT(*) AS n FROM articles", &[]).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::types::{Record, Row, Value};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::query::Query;
use sqlx::query_builder::Separated;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, QueryBuilder, Row as _, Sqlite, TypeInfo, ValueRef};
use std::path::Path;
use std::str::FromStr;

/// Upper bound on bound parameters per INSERT statement
///
/// Matches the historical SQLite default so generated statements work on
/// every build of the engine.
pub const MAX_BIND_PARAMS: usize = 999;

/// How `insert_many` treats rows already in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Keep existing rows
    #[default]
    Append,

    /// Delete existing rows first; the table and its constraints stay
    Replace,
}

/// SQL-executing connection abstraction
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute one statement in its own transaction
    ///
    /// # Returns
    /// Number of rows affected
    async fn execute(&self, statement: &str) -> Result<u64>;

    /// Insert rows into an existing table in one transaction
    ///
    /// # Arguments
    /// * `table` - Target table
    /// * `columns` - Column names, positionally matching each row's values
    /// * `rows` - Rows to insert
    /// * `mode` - Append to or replace the table's rows
    async fn insert_many(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Row],
        mode: InsertMode,
    ) -> Result<u64>;

    /// Run a read statement with positional `?` parameters
    async fn fetch(&self, statement: &str, params: &[Value]) -> Result<Vec<Record>>;

    /// Like [`Backend::fetch`], on a connection that cannot modify the database
    ///
    /// Any write attempted by `statement` is rejected by the engine.
    async fn fetch_read_only(&self, statement: &str, params: &[Value]) -> Result<Vec<Record>>;
}

/// SQLite backend on an sqlx pool
///
/// Writes go through `pool`; `reader` opens the same database with
/// `SQLITE_OPEN_READONLY` for [`Backend::fetch_read_only`].
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
    reader: SqlitePool,
}

impl SqliteBackend {
    /// Connect using a `sqlite://` URL, creating the file if missing
    ///
    /// Foreign key enforcement is switched on for every connection.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?;
        Self::connect_with(options).await
    }

    /// Open (or create) a database file
    pub async fn open(path: &Path) -> Result<Self> {
        Self::connect_with(SqliteConnectOptions::new().filename(path)).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        let options = options.create_if_missing(true).foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options.clone())
            .await?;
        // lazy, and created after the writer so the file exists
        let reader = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(options.create_if_missing(false).read_only(true));
        Ok(Self { pool, reader })
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn execute(&self, statement: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let done = sqlx::query(statement).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(done.rows_affected())
    }

    async fn insert_many(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Row],
        mode: InsertMode,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        if mode == InsertMode::Replace {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }

        let mut inserted = 0;
        if !columns.is_empty() {
            let rows_per_statement = (MAX_BIND_PARAMS / columns.len()).max(1);
            let prefix = format!("INSERT INTO {} ({}) ", table, columns.join(", "));

            for chunk in rows.chunks(rows_per_statement) {
                let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(&prefix);
                builder.push_values(chunk, |mut separated, row| {
                    for value in &row.values {
                        push_value(&mut separated, value);
                    }
                });
                inserted += builder.build().execute(&mut *tx).await?.rows_affected();
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn fetch(&self, statement: &str, params: &[Value]) -> Result<Vec<Record>> {
        fetch_on(&self.pool, statement, params).await
    }

    async fn fetch_read_only(&self, statement: &str, params: &[Value]) -> Result<Vec<Record>> {
        fetch_on(&self.reader, statement, params).await
    }
}

async fn fetch_on(pool: &SqlitePool, statement: &str, params: &[Value]) -> Result<Vec<Record>> {
    let query = params
        .iter()
        .fold(sqlx::query(statement), |query, param| bind_value(query, param));

    let mut conn = pool.acquire().await?;
    let rows = query.fetch_all(&mut *conn).await?;
    let records = rows
        .iter()
        .map(decode_row)
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;
    Ok(records)
}

fn push_value(separated: &mut Separated<'_, '_, Sqlite, &'static str>, value: &Value) {
    match value {
        Value::Integer(v) => separated.push_bind(*v),
        Value::Float(v) => separated.push_bind(*v),
        Value::Text(v) => separated.push_bind(v.clone()),
        Value::Boolean(v) => separated.push_bind(*v),
        Value::Timestamp(v) => separated.push_bind(*v),
        Value::Null => separated.push_bind(None::<String>),
    };
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Integer(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
        Value::Boolean(v) => query.bind(*v),
        Value::Timestamp(v) => query.bind(*v),
        Value::Null => query.bind(None::<String>),
    }
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Decode one row into a record
///
/// SQLite types values dynamically, so the stored value's class picks the
/// variant; the declared column type refines integers to booleans and text
/// to timestamps.
fn decode_row(row: &SqliteRow) -> std::result::Result<Record, sqlx::Error> {
    let mut record = Record::with_capacity(row.len());

    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            record.push(column.name(), Value::Null);
            continue;
        }

        let stored = raw.type_info().name().to_string();
        let declared = column.type_info().name().to_ascii_uppercase();

        let value = match stored.as_str() {
            "INTEGER" => {
                let v: i64 = row.try_get(idx)?;
                if declared == "BOOLEAN" {
                    Value::Boolean(v != 0)
                } else {
                    Value::Integer(v)
                }
            }
            "REAL" => Value::Float(row.try_get(idx)?),
            "BLOB" => {
                let bytes: Vec<u8> = row.try_get(idx)?;
                Value::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            _ => {
                let text: String = row.try_get(idx)?;
                let is_temporal = matches!(declared.as_str(), "DATETIME" | "DATE");
                match parse_timestamp(&text) {
                    Some(ts) if is_temporal => Value::Timestamp(ts),
                    _ => Value::Text(text),
                }
            }
        };
        record.push(column.name(), value);
    }

    Ok(record)
}
