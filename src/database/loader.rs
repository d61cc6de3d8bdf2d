//! Columnar data loader
//!
//! This module reads Parquet files fully into memory as a [`Table`]. The same
//! materialized table feeds schema inference (native types, observed nulls)
//! and the bulk load (rows).
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::database::DataLoader;
//! use std::path::Path;
//!
//! let table = DataLoader::new().read_parquet(Path::new("data/customers.parquet"))?;
//! println!("{} rows, {} columns", table.num_rows(), table.num_columns());
//! # Ok::<(), deck_db::DeckError>(())
//! ```

use crate::database::inference::NativeType;
use crate::error::{DeckError, Result};
use crate::types::{Row, Table, TableColumn, Value};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow_array::{Array, RecordBatch};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{DataType, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;

/// Data loader
///
/// Provides methods for materializing columnar files.
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self
    }

    /// Read a Parquet file into memory
    ///
    /// The table is named after the file stem.
    ///
    /// # Arguments
    /// * `path` - Path to the Parquet file
    pub fn read_parquet(&self, path: &Path) -> Result<Table> {
        let columnar = |message: String| DeckError::Columnar {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| DeckError::io(path, e))?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| columnar(e.to_string()))?;

        let columns = builder
            .schema()
            .fields()
            .iter()
            .map(|field| {
                TableColumn::new(
                    field.name().clone(),
                    NativeType::from_arrow(field.data_type()),
                )
            })
            .collect();

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let mut table = Table::new(name, columns);

        let reader = builder.build().map_err(|e| columnar(e.to_string()))?;
        for batch in reader {
            let batch = batch.map_err(|e| columnar(e.to_string()))?;
            append_batch(&mut table, &batch).map_err(columnar)?;
        }

        Ok(table)
    }
}

/// Append the rows of one record batch to a table
fn append_batch(table: &mut Table, batch: &RecordBatch) -> std::result::Result<(), String> {
    if batch.num_columns() != table.columns.len() {
        return Err(format!(
            "batch has {} columns but file schema has {}",
            batch.num_columns(),
            table.columns.len()
        ));
    }

    let mut columns = Vec::with_capacity(batch.num_columns());
    for (idx, array) in batch.columns().iter().enumerate() {
        table.columns[idx].null_count += array.null_count();
        columns.push(array_values(array.as_ref())?);
    }

    table.rows.reserve(batch.num_rows());
    for row_idx in 0..batch.num_rows() {
        let values = columns
            .iter_mut()
            .map(|col| std::mem::replace(&mut col[row_idx], Value::Null))
            .collect();
        table.rows.push(Row::new(values));
    }
    Ok(())
}

fn collect<F>(array: &dyn Array, mut value_at: F) -> Vec<Value>
where
    F: FnMut(usize) -> Value,
{
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Value::Null
            } else {
                value_at(i)
            }
        })
        .collect()
}

fn timestamp(value: Option<chrono::NaiveDateTime>) -> Value {
    value.map(Value::Timestamp).unwrap_or(Value::Null)
}

/// Calendar dates load as ISO text, matching their `TEXT` column
fn date(value: Option<chrono::NaiveDate>) -> Value {
    value
        .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null)
}

/// Convert an Arrow array into tagged values
///
/// Types without a dedicated mapping are rendered as text.
fn array_values(array: &dyn Array) -> std::result::Result<Vec<Value>, String> {
    let values = match array.data_type() {
        DataType::Int8 => {
            let a = array.as_primitive::<Int8Type>();
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::Int16 => {
            let a = array.as_primitive::<Int16Type>();
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::Int32 => {
            let a = array.as_primitive::<Int32Type>();
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::Int64 => {
            let a = array.as_primitive::<Int64Type>();
            collect(array, |i| Value::Integer(a.value(i)))
        }
        DataType::UInt8 => {
            let a = array.as_primitive::<UInt8Type>();
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::UInt16 => {
            let a = array.as_primitive::<UInt16Type>();
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::UInt32 => {
            let a = array.as_primitive::<UInt32Type>();
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::UInt64 => {
            let a = array.as_primitive::<UInt64Type>();
            collect(array, |i| match i64::try_from(a.value(i)) {
                Ok(v) => Value::Integer(v),
                Err(_) => Value::Text(a.value(i).to_string()),
            })
        }
        DataType::Float32 => {
            let a = array.as_primitive::<Float32Type>();
            collect(array, |i| Value::Float(a.value(i).into()))
        }
        DataType::Float64 => {
            let a = array.as_primitive::<Float64Type>();
            collect(array, |i| Value::Float(a.value(i)))
        }
        DataType::Boolean => {
            let a = array.as_boolean();
            collect(array, |i| Value::Boolean(a.value(i)))
        }
        DataType::Utf8 => {
            let a = array.as_string::<i32>();
            collect(array, |i| Value::Text(a.value(i).to_string()))
        }
        DataType::LargeUtf8 => {
            let a = array.as_string::<i64>();
            collect(array, |i| Value::Text(a.value(i).to_string()))
        }
        DataType::Utf8View => {
            let a = array.as_string_view();
            collect(array, |i| Value::Text(a.value(i).to_string()))
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            let a = array.as_primitive::<TimestampSecondType>();
            collect(array, |i| timestamp(a.value_as_datetime(i)))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let a = array.as_primitive::<TimestampMillisecondType>();
            collect(array, |i| timestamp(a.value_as_datetime(i)))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let a = array.as_primitive::<TimestampMicrosecondType>();
            collect(array, |i| timestamp(a.value_as_datetime(i)))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let a = array.as_primitive::<TimestampNanosecondType>();
            collect(array, |i| timestamp(a.value_as_datetime(i)))
        }
        DataType::Date32 => {
            let a = array.as_primitive::<Date32Type>();
            collect(array, |i| date(a.value_as_date(i)))
        }
        DataType::Date64 => {
            let a = array.as_primitive::<Date64Type>();
            collect(array, |i| date(a.value_as_date(i)))
        }
        _ => {
            let formatter = ArrayFormatter::try_new(array, &FormatOptions::default())
                .map_err(|e| e.to_string())?;
            collect(array, |i| Value::Text(formatter.value(i).to_string()))
        }
    };
    Ok(values)
}
