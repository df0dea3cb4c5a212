//! Scalar cell values and column types
//!
//! Every cell of a loaded table is one [`ScalarValue`]. The set of tags is
//! closed: a column whose warehouse type has no tag here is rejected when the
//! table is loaded, so nothing downstream ever sees an unsupported value.

use crate::error::{EditorError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Default precision and scale of a bare `DECIMAL`
const DEFAULT_DECIMAL_PRECISION: u8 = 10;
const DEFAULT_DECIMAL_SCALE: u8 = 0;

/// Column type inferred from the warehouse result schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    Null,
    Boolean,
    Integer,
    Float,
    Decimal { precision: u8, scale: u8 },
    Text,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Map a warehouse type (`INT`, `DECIMAL(10,2)`, `TIMESTAMP_NTZ`, ...) to a column type.
    ///
    /// `column` is only used for the error message.
    pub fn from_type_text(column: &str, type_text: &str) -> Result<Self> {
        let upper = type_text.trim().to_uppercase();
        let base = upper.split('(').next().unwrap_or(&upper).trim();

        let column_type = match base {
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "TINYINT" | "BYTE" | "SMALLINT" | "SHORT" | "INT" | "INTEGER" | "BIGINT" | "LONG" => {
                Self::Integer
            }
            "FLOAT" | "REAL" | "DOUBLE" => Self::Float,
            "DECIMAL" | "DEC" | "NUMERIC" => {
                let (precision, scale) = parse_decimal_params(&upper);
                Self::Decimal { precision, scale }
            }
            "STRING" | "VARCHAR" | "CHAR" | "TEXT" => Self::Text,
            "DATE" => Self::Date,
            "TIMESTAMP" | "TIMESTAMP_NTZ" => Self::Timestamp,
            "NULL" | "VOID" => Self::Null,
            _ => return Err(EditorError::unsupported_type(column, type_text)),
        };

        Ok(column_type)
    }

    /// DuckDB type used when reading the editable grid back in
    pub fn duckdb_type(&self) -> String {
        match self {
            Self::Null | Self::Text => "VARCHAR".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Integer => "BIGINT".to_string(),
            Self::Float => "DOUBLE".to_string(),
            Self::Decimal { precision, scale } => format!("DECIMAL({},{})", precision, scale),
            Self::Date => "DATE".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            Self::Text => write!(f, "text"),
            Self::Date => write!(f, "date"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Parse precision and scale from a `DECIMAL(p,s)` type string.
fn parse_decimal_params(type_text: &str) -> (u8, u8) {
    let (Some(start), Some(end)) = (type_text.find('('), type_text.find(')')) else {
        return (DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE);
    };
    if end <= start {
        return (DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE);
    }

    let mut parts = type_text[start + 1..end].split(',').map(|s| s.trim());
    let precision = parts
        .next()
        .and_then(|p| p.parse::<u8>().ok())
        .unwrap_or(DEFAULT_DECIMAL_PRECISION);
    let scale = parts
        .next()
        .and_then(|s| s.parse::<u8>().ok())
        .unwrap_or(DEFAULT_DECIMAL_SCALE);

    (precision, scale)
}

/// One cell of a table snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "float_text")] f64),
    /// Exact decimal digits as returned by the warehouse, e.g. `-12.30`
    Decimal(String),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl ScalarValue {
    /// Parse a cell from the warehouse's JSON_ARRAY result format.
    pub fn from_warehouse(raw: Option<&str>, column_type: ColumnType) -> Result<Self> {
        let Some(raw) = raw else {
            return Ok(Self::Null);
        };

        let value = match column_type {
            ColumnType::Null => {
                return Err(EditorError::invalid_input(format!(
                    "Unexpected value '{}' in a NULL-typed column",
                    raw
                )))
            }
            ColumnType::Boolean => match raw.trim().to_lowercase().as_str() {
                "true" => Self::Bool(true),
                "false" => Self::Bool(false),
                other => {
                    return Err(EditorError::invalid_input(format!(
                        "Invalid boolean value: {}",
                        other
                    )))
                }
            },
            ColumnType::Integer => Self::Int(raw.trim().parse().map_err(|_| {
                EditorError::invalid_input(format!("Invalid integer value: {}", raw))
            })?),
            ColumnType::Float => Self::Float(raw.trim().parse().map_err(|_| {
                EditorError::invalid_input(format!("Invalid floating point value: {}", raw))
            })?),
            ColumnType::Decimal { .. } => Self::Decimal(parse_decimal_digits(raw)?),
            ColumnType::Text => Self::Text(raw.to_string()),
            ColumnType::Date => Self::Date(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    EditorError::invalid_input(format!("Invalid date value: {}", raw))
                })?,
            ),
            ColumnType::Timestamp => Self::Timestamp(parse_timestamp(raw)?),
        };

        Ok(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the tag, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Whether this value may be stored in a column of the given type
    pub fn fits(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Self::Null, _)
                | (Self::Bool(_), ColumnType::Boolean)
                | (Self::Int(_), ColumnType::Integer)
                | (Self::Float(_), ColumnType::Float)
                | (Self::Decimal(_), ColumnType::Decimal { .. })
                | (Self::Text(_), ColumnType::Text)
                | (Self::Date(_), ColumnType::Date)
                | (Self::Timestamp(_), ColumnType::Timestamp)
        )
    }

    /// Plain text form used in the editable grid. Nulls are empty.
    pub fn grid_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{:?}", f),
            Self::Decimal(d) => d.clone(),
            Self::Text(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }

    fn float_key(f: f64) -> u64 {
        if f.is_nan() {
            f64::NAN.to_bits()
        } else {
            f.to_bits()
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => Self::float_key(*a) == Self::float_key(*b),
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => Self::float_key(*f).hash(state),
            Self::Decimal(d) => d.hash(state),
            Self::Text(s) => s.hash(state),
            Self::Date(d) => d.hash(state),
            Self::Timestamp(ts) => ts.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.grid_text()),
        }
    }
}

/// Validate decimal digits: optional sign, digits, optional fraction.
fn parse_decimal_digits(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits_ok = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let valid = digits_ok(int_part) && frac_part.map_or(true, digits_ok);

    if !valid {
        return Err(EditorError::invalid_input(format!(
            "Invalid decimal value: {}",
            raw
        )));
    }

    Ok(trimmed.trim_start_matches('+').to_string())
}

/// Parse the timestamp forms the warehouse and users produce.
///
/// Offsets are normalized to UTC; values without an offset are taken as-is.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(EditorError::invalid_input(format!(
        "Invalid timestamp value: {}",
        raw
    )))
}

/// Floats are stored as text so NaN and infinities survive JSON.
mod float_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:?}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
