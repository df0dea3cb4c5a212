//! In-memory table snapshots and their on-disk form

use crate::client::QueryResult;
use crate::error::{EditorError, Result};
use crate::literal;
use crate::value::{ColumnType, ScalarValue};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// zstd level used for stored baselines
const COMPRESSION_LEVEL: i32 = 3;

/// Column name and inferred type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A row is an ordered sequence of cells in column order
pub type Row = Vec<ScalarValue>;

/// Immutable copy of a table's rows at the moment it was read.
///
/// All rows have exactly one cell per column, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl TableSnapshot {
    /// Build a snapshot, checking every row against the column list
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(EditorError::schema_mismatch(format!(
                    "row {} has {} cells but the table has {} columns",
                    index,
                    row.len(),
                    columns.len()
                )));
            }
            for (value, column) in row.iter().zip(&columns) {
                if !value.fits(column.column_type) {
                    return Err(EditorError::schema_mismatch(format!(
                        "row {} column '{}' holds a {} value but the column is {}",
                        index,
                        column.name,
                        value.kind(),
                        column.column_type
                    )));
                }
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Convert a warehouse result into a typed snapshot.
    ///
    /// Fails with `UnsupportedType` if any column has a type outside the
    /// scalar set, which keeps such tables away from the editor.
    pub fn from_query_result(result: &QueryResult) -> Result<Self> {
        let columns = result
            .columns
            .iter()
            .map(|c| {
                let type_text = if c.type_text.is_empty() {
                    &c.type_name
                } else {
                    &c.type_text
                };
                Ok(Column::new(
                    c.name.clone(),
                    ColumnType::from_type_text(&c.name, type_text)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(result.rows.len());
        for (index, raw_row) in result.rows.iter().enumerate() {
            if raw_row.len() != columns.len() {
                return Err(EditorError::schema_mismatch(format!(
                    "result row {} has {} cells but the result has {} columns",
                    index,
                    raw_row.len(),
                    columns.len()
                )));
            }
            let row = raw_row
                .iter()
                .zip(&columns)
                .map(|(cell, column)| ScalarValue::from_warehouse(cell.as_deref(), column.column_type))
                .collect::<Result<Row>>()?;
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Same column names and types, in the same order
    pub fn same_shape(&self, other: &TableSnapshot) -> bool {
        self.columns == other.columns
    }

    /// The rows the table holds after being overwritten with this snapshot
    pub fn as_stored(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(literal::stored_value).collect())
                .collect(),
        }
    }

    /// Content fingerprint over columns and rows, in order
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = Hasher::new();
        hasher.update(&serde_json::to_vec(&self.columns)?);
        for row in &self.rows {
            hasher.update(&serde_json::to_vec(row)?);
            hasher.update(b"\n");
        }
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Write the snapshot as zstd-compressed JSON
    pub fn write_compressed(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut encoder = zstd::Encoder::new(BufWriter::new(file), COMPRESSION_LEVEL)?;
        serde_json::to_writer(&mut encoder, self)?;
        let mut writer = encoder.finish()?;
        writer.flush()?;
        Ok(())
    }

    /// Read a snapshot written by [`TableSnapshot::write_compressed`]
    pub fn read_compressed(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let decoder = zstd::Decoder::new(file)?;
        let stored: TableSnapshot = serde_json::from_reader(decoder)?;
        Self::new(stored.columns, stored.rows)
    }
}
