//! Editable grid files
//!
//! A checked-out table is written as a CSV grid the user edits with any
//! tool, and read back through DuckDB with the column types pinned to the
//! types of the original table. Text cells are always quoted, so a bare
//! empty field is NULL while `""` is the empty string.

use crate::error::{EditorError, Result};
use crate::snapshot::{Column, Row, TableSnapshot};
use crate::value::{ColumnType, ScalarValue};
use chrono::{DateTime, NaiveDate, Utc};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;
use log::debug;
use std::fs;
use std::path::Path;

/// `NaiveDate::num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Render a snapshot as CSV grid text
pub fn create_csv_content(snapshot: &TableSnapshot) -> String {
    let mut csv = String::new();

    let header: Vec<String> = snapshot
        .columns()
        .iter()
        .map(|c| quote_field(&c.name))
        .collect();
    csv.push_str(&header.join(","));
    csv.push('\n');

    for row in snapshot.rows() {
        let fields: Vec<String> = row.iter().map(csv_field).collect();
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }

    csv
}

/// Write the editable grid for a snapshot
pub fn write_grid(snapshot: &TableSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, create_csv_content(snapshot))?;
    debug!(
        "Wrote {} rows to grid {}",
        snapshot.row_count(),
        path.display()
    );
    Ok(())
}

fn csv_field(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => String::new(),
        ScalarValue::Text(s) => quote_field(s),
        other => other.grid_text(),
    }
}

fn quote_field(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Reads edited grids back into typed snapshots
pub struct GridReader {
    connection: Connection,
}

impl GridReader {
    pub fn new() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        Ok(Self { connection })
    }

    /// Read a grid, requiring exactly the given columns in the given order
    pub fn read_grid(&self, path: &Path, columns: &[Column]) -> Result<TableSnapshot> {
        if !path.is_file() {
            return Err(EditorError::invalid_input(format!(
                "Grid file not found: {}",
                path.display()
            )));
        }

        self.check_header(path, columns)?;

        let sql = format!(
            "SELECT * FROM read_csv('{}', header = true, auto_detect = false, delim = ',', \
             quote = '\"', escape = '\"', allow_quoted_nulls = false, columns = {})",
            sql_path(path),
            columns_struct(columns)
        );

        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| convert_duckdb_error(e, path))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| convert_duckdb_error(e, path))?;

        let mut data: Vec<Row> = Vec::new();
        while let Some(row) = rows.next().map_err(|e| convert_duckdb_error(e, path))? {
            let mut cells = Vec::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                let value = row.get_ref(index)?;
                cells.push(to_scalar(value, column)?);
            }
            data.push(cells);
        }

        debug!("Read {} rows from grid {}", data.len(), path.display());
        TableSnapshot::new(columns.to_vec(), data)
    }

    /// Compare the grid's header line to the expected column names
    fn check_header(&self, path: &Path, columns: &[Column]) -> Result<()> {
        let sql = format!(
            "SELECT * FROM read_csv('{}', header = false, all_varchar = true, delim = ',', \
             quote = '\"', escape = '\"') LIMIT 1",
            sql_path(path)
        );

        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| convert_duckdb_error(e, path))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| convert_duckdb_error(e, path))?;
        let Some(row) = rows.next().map_err(|e| convert_duckdb_error(e, path))? else {
            return Err(EditorError::schema_mismatch(format!(
                "grid {} has no header line",
                path.display()
            )));
        };

        let width = row.as_ref().column_count();
        let mut header = Vec::with_capacity(width);
        for index in 0..width {
            header.push(row.get::<_, Option<String>>(index)?.unwrap_or_default());
        }

        let expected: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        if header != expected {
            return Err(EditorError::schema_mismatch(format!(
                "grid columns [{}] do not match table columns [{}]",
                header.join(", "),
                expected.join(", ")
            )));
        }

        Ok(())
    }
}

/// `{'name': 'TYPE', ...}` for `read_csv(columns = ...)`
fn columns_struct(columns: &[Column]) -> String {
    let entries: Vec<String> = columns
        .iter()
        .map(|c| {
            format!(
                "'{}': '{}'",
                c.name.replace('\'', "''"),
                c.column_type.duckdb_type()
            )
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn sql_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "''")
}

/// Turn a DuckDB value into the cell type of its column
fn to_scalar(value: ValueRef<'_>, column: &Column) -> Result<ScalarValue> {
    let scalar = match (value, column.column_type) {
        (ValueRef::Null, _) => ScalarValue::Null,
        (ValueRef::Boolean(b), ColumnType::Boolean) => ScalarValue::Bool(b),
        (ValueRef::TinyInt(i), ColumnType::Integer) => ScalarValue::Int(i64::from(i)),
        (ValueRef::SmallInt(i), ColumnType::Integer) => ScalarValue::Int(i64::from(i)),
        (ValueRef::Int(i), ColumnType::Integer) => ScalarValue::Int(i64::from(i)),
        (ValueRef::BigInt(i), ColumnType::Integer) => ScalarValue::Int(i),
        (ValueRef::HugeInt(i), ColumnType::Integer) => {
            ScalarValue::Int(i64::try_from(i).map_err(|_| {
                EditorError::invalid_input(format!(
                    "Value {} in column '{}' is out of range",
                    i, column.name
                ))
            })?)
        }
        (ValueRef::Double(f), ColumnType::Float) => ScalarValue::Float(f),
        (ValueRef::Float(f), ColumnType::Float) => ScalarValue::Float(f64::from(f)),
        (ValueRef::Decimal(d), ColumnType::Decimal { .. }) => ScalarValue::Decimal(d.to_string()),
        (ValueRef::Text(bytes), ColumnType::Text) => {
            ScalarValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
        (ValueRef::Date32(days), ColumnType::Date) => ScalarValue::Date(date_from_days(days)?),
        (ValueRef::Timestamp(unit, raw), ColumnType::Timestamp) => {
            ScalarValue::Timestamp(timestamp_from_raw(unit, raw)?)
        }
        (other, column_type) => {
            return Err(EditorError::invalid_input(format!(
                "Column '{}' is {} but the grid holds {:?}",
                column.name,
                column_type,
                other.data_type()
            )))
        }
    };

    Ok(scalar)
}

fn date_from_days(days: i32) -> Result<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| EditorError::invalid_input(format!("Date out of range: {} days", days)))
}

fn timestamp_from_raw(unit: TimeUnit, raw: i64) -> Result<chrono::NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => raw.checked_mul(1_000_000),
        TimeUnit::Millisecond => raw.checked_mul(1_000),
        TimeUnit::Microsecond => Some(raw),
        TimeUnit::Nanosecond => Some(raw.div_euclid(1_000)),
    };

    micros
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| EditorError::invalid_input(format!("Timestamp out of range: {}", raw)))
}

/// Map DuckDB errors about malformed grids to user-facing input errors
fn convert_duckdb_error(error: duckdb::Error, path: &Path) -> EditorError {
    let message = error.to_string();

    if message.contains("CSV Error")
        || message.contains("Could not convert")
        || message.contains("Conversion Error")
        || message.contains("Unterminated quoted field")
    {
        EditorError::invalid_input(format!(
            "Malformed grid '{}': {}",
            path.display(),
            message
        ))
    } else if message.contains("No files found") || message.contains("does not exist") {
        EditorError::invalid_input(format!("Grid file not found: {}", path.display()))
    } else {
        EditorError::DuckDb(error)
    }
}
