//! Write result tables to Apache Parquet files.
//!
//! Result CSVs carry no type information, so column types are inferred by
//! scanning cell values before building typed, columnar output with Zstd
//! compression. This keeps downstream tools (DuckDB, Polars, Spark) from
//! having to treat every column as a string.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use minerva_core::Table;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur during Parquet conversion or writing.
#[derive(Debug, thiserror::Error)]
pub enum ParquetError {
    /// Failed to build Arrow arrays from the table.
    #[error("Arrow conversion error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Failed to write the Parquet file.
    #[error("Parquet write error: {0}")]
    Write(#[from] parquet::errors::ParquetError),

    /// I/O error when creating/writing the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

/// Pick the narrowest Arrow type every non-null cell of a column fits.
///
/// Order of preference: Int64, Float64, Boolean, Utf8. A column with no
/// non-null cells stays Utf8.
fn infer_column_type(rows: &[Vec<Option<String>>], col_idx: usize) -> DataType {
    let mut saw_value = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;

    for row in rows {
        let Some(Some(cell)) = row.get(col_idx) else {
            continue;
        };
        saw_value = true;

        if all_int && cell.parse::<i64>().is_err() {
            all_int = false;
        }
        if all_float && cell.parse::<f64>().is_err() {
            all_float = false;
        }
        if all_bool && !matches!(cell.as_str(), "true" | "false") {
            all_bool = false;
        }
        if !all_int && !all_float && !all_bool {
            return DataType::Utf8;
        }
    }

    if !saw_value {
        return DataType::Utf8;
    }
    if all_int {
        DataType::Int64
    } else if all_float {
        DataType::Float64
    } else if all_bool {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

/// Build an Arrow [`Schema`] for the table, inferring each column's type.
fn build_schema(table: &Table) -> Schema {
    let fields: Vec<Field> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| Field::new(name, infer_column_type(&table.rows, i), true))
        .collect();
    Schema::new(fields)
}

// ---------------------------------------------------------------------------
// Column builders
// ---------------------------------------------------------------------------

/// Build typed Arrow arrays from the string-based rows.
///
/// Cells that fail to parse as the inferred type become NULL in the output.
fn build_arrays(table: &Table, schema: &Schema) -> Result<Vec<ArrayRef>, ParquetError> {
    let num_rows = table.rows.len();
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());

    for (col_idx, field) in schema.fields().iter().enumerate() {
        let array: ArrayRef = match field.data_type() {
            DataType::Int64 => {
                let mut builder = Int64Builder::with_capacity(num_rows);
                for row in &table.rows {
                    match row.get(col_idx).and_then(|v| v.as_deref()) {
                        Some(s) => match s.parse::<i64>() {
                            Ok(v) => builder.append_value(v),
                            Err(_) => builder.append_null(),
                        },
                        None => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Float64 => {
                let mut builder = Float64Builder::with_capacity(num_rows);
                for row in &table.rows {
                    match row.get(col_idx).and_then(|v| v.as_deref()) {
                        Some(s) => match s.parse::<f64>() {
                            Ok(v) => builder.append_value(v),
                            Err(_) => builder.append_null(),
                        },
                        None => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Boolean => {
                let mut builder = BooleanBuilder::with_capacity(num_rows);
                for row in &table.rows {
                    match row.get(col_idx).and_then(|v| v.as_deref()) {
                        Some("true") => builder.append_value(true),
                        Some("false") => builder.append_value(false),
                        _ => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            // Default: UTF-8 string
            _ => {
                let mut builder = StringBuilder::with_capacity(num_rows, num_rows * 32);
                for row in &table.rows {
                    match row.get(col_idx).and_then(|v| v.as_deref()) {
                        Some(s) => builder.append_value(s),
                        None => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
        };

        arrays.push(array);
    }

    Ok(arrays)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert a [`Table`] into an Arrow [`RecordBatch`].
pub fn table_to_record_batch(table: &Table) -> Result<RecordBatch, ParquetError> {
    let schema = Arc::new(build_schema(table));
    let arrays = build_arrays(table, &schema)?;
    let batch = RecordBatch::try_new(schema, arrays)?;
    Ok(batch)
}

/// Write a [`Table`] to a Parquet file at the given path.
///
/// Uses Zstd compression. Returns the number of rows written.
pub fn write_parquet(table: &Table, path: &Path) -> Result<u64, ParquetError> {
    let batch = table_to_record_batch(table)?;
    let row_count = batch.num_rows() as u64;

    // Ensure parent directories exist.
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!(
        path = %path.display(),
        rows = row_count,
        "Wrote Parquet file"
    );

    Ok(row_count)
}

/// Write a [`Table`] to an in-memory Parquet buffer.
///
/// Returns the raw bytes of a valid Parquet file. Useful when handing the
/// result on without touching disk.
pub fn write_parquet_bytes(table: &Table) -> Result<Vec<u8>, ParquetError> {
    let batch = table_to_record_batch(table)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
