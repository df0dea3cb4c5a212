//! SQL literal encoding for Databricks SQL
//!
//! Turns one [`ScalarValue`] into the exact text placed inside a `VALUES`
//! list. Rules, in priority order:
//!
//! 1. null, and the NaN "missing" sentinel, become `NULL`
//! 2. dates become `'YYYY-MM-DD'`
//! 3. timestamps become `'YYYY-MM-DD HH:MM:SS'` (sub-second digits dropped)
//! 4. everything else uses its canonical literal: numbers and booleans bare,
//!    strings single-quoted with backslash escapes

use crate::value::ScalarValue;
use chrono::SubsecRound;

/// Encode a cell value as a SQL literal.
pub fn encode(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => "NULL".to_string(),
        ScalarValue::Float(f) if f.is_nan() => "NULL".to_string(),
        ScalarValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        ScalarValue::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
        ScalarValue::Bool(true) => "TRUE".to_string(),
        ScalarValue::Bool(false) => "FALSE".to_string(),
        ScalarValue::Int(i) => i.to_string(),
        ScalarValue::Float(f) => encode_float(*f),
        ScalarValue::Decimal(digits) => digits.clone(),
        ScalarValue::Text(s) => quote_text(s),
    }
}

/// The value a column holds once `encode(value)` has been written: NaN
/// becomes NULL and timestamps lose their sub-second digits.
pub fn stored_value(value: &ScalarValue) -> ScalarValue {
    match value {
        ScalarValue::Float(f) if f.is_nan() => ScalarValue::Null,
        ScalarValue::Timestamp(ts) => ScalarValue::Timestamp(ts.trunc_subsecs(0)),
        other => other.clone(),
    }
}

/// Finite floats use the shortest form that parses back to the same bits.
/// Debug formatting always keeps a `.` or an exponent, so the literal is
/// never read as an integer.
fn encode_float(f: f64) -> String {
    if f == f64::INFINITY {
        "CAST('Infinity' AS DOUBLE)".to_string()
    } else if f == f64::NEG_INFINITY {
        "CAST('-Infinity' AS DOUBLE)".to_string()
    } else {
        format!("{:?}", f)
    }
}

/// Single-quote a string. Databricks string literals unescape backslash
/// sequences, so backslashes are escaped along with quotes and control
/// characters that would otherwise be altered.
pub fn quote_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}
