//! Column type inference
//!
//! Maps the storage type of a columnar file's columns onto SQL column types.
//! Inference never fails: unknown storage types degrade to `TEXT`.
//!
//! # Example
//!
//! ```rust
//! use deck_db::database::inference::{infer_column_type, NativeType};
//! use deck_db::database::SqlType;
//!
//! assert_eq!(infer_column_type(NativeType::Int64.tag(), true), (SqlType::BigInt, true));
//! assert_eq!(infer_column_type("decimal128(10, 2)", false), (SqlType::Text, false));
//! ```

use crate::database::schema::{Column, ForeignKey, Schema, SqlType};
use crate::types::Table;
use arrow_schema::DataType;
use log::warn;

/// Storage type vocabulary of columnar source data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// 64-bit integer
    Int64,

    /// 32-bit (or narrower) integer
    Int32,

    /// 64-bit float
    Float64,

    /// 32-bit (or narrower) float
    Float32,

    /// Boolean
    Bool,

    /// Typed string column
    String,

    /// Timestamp or date
    Timestamp,

    /// Untyped fallback: Arrow strings, decimals, nested and binary data
    Object,
}

/// Substring lookup table, checked in order
const TYPE_MAP: [(&str, SqlType); 7] = [
    ("int64", SqlType::BigInt),
    ("int32", SqlType::Int),
    ("float64", SqlType::Double),
    ("float32", SqlType::Float),
    ("bool", SqlType::Boolean),
    ("string", SqlType::Varchar(255)),
    ("datetime64[ns]", SqlType::DateTime),
];

impl NativeType {
    /// Every native type
    pub const ALL: [NativeType; 8] = [
        NativeType::Int64,
        NativeType::Int32,
        NativeType::Float64,
        NativeType::Float32,
        NativeType::Bool,
        NativeType::String,
        NativeType::Timestamp,
        NativeType::Object,
    ];

    /// Type tag as matched by [`infer_column_type`]
    pub fn tag(&self) -> &'static str {
        match self {
            NativeType::Int64 => "int64",
            NativeType::Int32 => "int32",
            NativeType::Float64 => "float64",
            NativeType::Float32 => "float32",
            NativeType::Bool => "bool",
            NativeType::String => "string",
            NativeType::Timestamp => "datetime64[ns]",
            NativeType::Object => "object",
        }
    }

    /// Native type of an Arrow column
    ///
    /// Arrow string columns materialize as untyped objects, so they infer
    /// `TEXT` rather than a bounded `VARCHAR`. So do calendar dates and
    /// zone-aware timestamps; only naive timestamps are `datetime64[ns]`.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int64 | DataType::UInt32 | DataType::UInt64 => NativeType::Int64,
            DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt16
            | DataType::UInt8 => NativeType::Int32,
            DataType::Float64 => NativeType::Float64,
            DataType::Float32 | DataType::Float16 => NativeType::Float32,
            DataType::Boolean => NativeType::Bool,
            DataType::Timestamp(_, None) => NativeType::Timestamp,
            _ => NativeType::Object,
        }
    }
}

/// Infer the SQL type and nullability of a column
///
/// # Arguments
/// * `tag` - Native storage type tag, matched case-sensitively by substring
/// * `has_nulls` - Whether the column's data contains any null
pub fn infer_column_type(tag: &str, has_nulls: bool) -> (SqlType, bool) {
    let sql_type = TYPE_MAP
        .iter()
        .find(|(key, _)| tag.contains(key))
        .map(|(_, sql_type)| sql_type.clone())
        .unwrap_or(SqlType::Text);
    (sql_type, has_nulls)
}

/// Generate a schema from a materialized table
///
/// # Arguments
/// * `table` - Materialized source data
/// * `table_name` - Name override; defaults to the table's own name
/// * `primary_key` - Optional primary key column
/// * `foreign_keys` - Foreign keys, in declaration order
///
/// A primary key that is not a column, or whose data has nulls, is kept
/// but logged; validation rejects the former before any DDL is emitted.
pub fn generate_schema(
    table: &Table,
    table_name: Option<&str>,
    primary_key: Option<&str>,
    foreign_keys: Vec<ForeignKey>,
) -> Schema {
    let columns = table
        .columns
        .iter()
        .map(|col| {
            let (sql_type, nullable) = infer_column_type(col.native_type.tag(), col.has_nulls());
            Column::new(col.name.clone(), sql_type, nullable)
        })
        .collect();

    if let Some(pk) = primary_key {
        match table.get_column(pk) {
            None => warn!("primary key '{}' is not a column of {}", pk, table.name),
            Some(col) if col.has_nulls() => warn!(
                "primary key '{}' of {} has {} null value(s)",
                pk, table.name, col.null_count
            ),
            Some(_) => {}
        }
    }

    Schema {
        table_name: table_name.unwrap_or(&table.name).to_string(),
        columns,
        primary_key: primary_key.map(str::to_string),
        foreign_keys,
    }
}
