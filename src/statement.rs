//! SQL statement construction
//!
//! Reads are `SELECT * FROM c.s.t`; writes replace the whole table with one
//! `INSERT OVERWRITE c.s.t VALUES (..),(..);` statement.

use crate::error::{EditorError, Result};
use crate::literal;
use crate::snapshot::{Row, TableSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fully qualified `catalog.schema.table` name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableName {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self> {
        let name = Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        };

        for (field, value) in [
            ("catalog", &name.catalog),
            ("schema", &name.schema),
            ("table", &name.table),
        ] {
            if value.trim().is_empty() {
                return Err(EditorError::empty_selection(field));
            }
        }

        Ok(name)
    }

    /// Parse `catalog.schema.table`. A part may be backtick-quoted, with
    /// backticks inside doubled, to hold dots or other characters.
    pub fn parse(full_name: &str) -> Result<Self> {
        let parts = split_name(full_name)?;
        match parts.as_slice() {
            [catalog, schema, table] => Self::new(catalog.clone(), schema.clone(), table.clone()),
            _ => Err(invalid_name(full_name)),
        }
    }

    /// Name as written into SQL text
    pub fn qualified(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_identifier(&self.catalog),
            quote_identifier(&self.schema),
            quote_identifier(&self.table)
        )
    }
}

/// Same text as [`TableName::qualified`], so a displayed name parses back
impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

fn invalid_name(full_name: &str) -> EditorError {
    EditorError::invalid_input(format!(
        "Expected a table name of the form catalog.schema.table, got '{}'",
        full_name
    ))
}

/// Split on dots outside backtick-quoted parts
fn split_name(full_name: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = full_name.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '`' if current.is_empty() => {
                loop {
                    match chars.next() {
                        Some('`') if chars.peek() == Some(&'`') => {
                            chars.next();
                            current.push('`');
                        }
                        Some('`') => break,
                        Some(other) => current.push(other),
                        None => return Err(invalid_name(full_name)),
                    }
                }
                // a closing backtick must end the part
                if !matches!(chars.peek(), None | Some(&'.')) {
                    return Err(invalid_name(full_name));
                }
            }
            '`' => return Err(invalid_name(full_name)),
            '.' => parts.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    parts.push(current);

    Ok(parts)
}

impl FromStr for TableName {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Plain identifiers stay bare; anything else is backtick-quoted.
pub fn quote_identifier(part: &str) -> String {
    let plain = !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        part.to_string()
    } else {
        format!("`{}`", part.replace('`', "``"))
    }
}

pub fn build_select(table: &TableName) -> String {
    format!("SELECT * FROM {}", table.qualified())
}

/// Render one row as `(<lit>,<lit>,...)`
pub fn build_row_tuple(row: &Row) -> String {
    let literals: Vec<String> = row.iter().map(literal::encode).collect();
    format!("({})", literals.join(","))
}

/// `INSERT OVERWRITE` for the given rows, or `None` when there are no rows
/// since an empty `VALUES` list is not valid SQL.
pub fn build_insert_overwrite(table: &TableName, rows: &[Row]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let values: Vec<String> = rows.iter().map(build_row_tuple).collect();
    Some(format!(
        "INSERT OVERWRITE {} VALUES {};",
        table.qualified(),
        values.join(",")
    ))
}

pub fn build_delete_all(table: &TableName) -> String {
    format!("DELETE FROM {};", table.qualified())
}

/// The single statement that makes the table hold exactly `snapshot`'s rows.
///
/// A snapshot with rows becomes an `INSERT OVERWRITE`; an empty one becomes
/// `DELETE FROM`, which empties the table in one statement.
pub fn build_overwrite(table: &TableName, snapshot: &TableSnapshot) -> String {
    build_insert_overwrite(table, snapshot.rows()).unwrap_or_else(|| build_delete_all(table))
}
