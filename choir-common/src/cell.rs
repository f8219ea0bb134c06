//! Spreadsheet cell model and normalization
//!
//! Spreadsheet rows arrive loosely typed and ragged: a cell may hold text, a
//! number, a boolean, an explicit null, or be absent because the row ended
//! early. Every normalizer here is total over [`Cell`]; malformed input
//! degrades to an empty string, `false` or `0` instead of failing the row.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// A single raw spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Column beyond the end of a ragged row
    Missing,
    /// Explicit empty value
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

/// One ordered row of raw cells
pub type Row = Vec<Cell>;

static MISSING: Cell = Cell::Missing;

/// Cell at `index`, or [`Cell::Missing`] past the end of the row
pub fn cell_at(row: &[Cell], index: usize) -> &Cell {
    row.get(index).unwrap_or(&MISSING)
}

impl Cell {
    /// True when the cell normalizes to an empty string
    pub fn is_blank(&self) -> bool {
        normalize_string(self).is_empty()
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s),
            // Sheets never nests values; keep the JSON text rather than dropping it
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing | Cell::Null => serializer.serialize_str(""),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Cell::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Cell::Number(_) => serializer.serialize_str(""),
            Cell::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Build a row from JSON values as returned by the Sheets `values` API
pub fn row_from_values(values: Vec<Value>) -> Row {
    values.into_iter().map(Cell::from).collect()
}

/// Canonical string form of a cell.
///
/// Null and missing cells become `""`, text is trimmed, finite numbers use
/// their shortest decimal form, booleans become `"TRUE"`/`"FALSE"`.
pub fn normalize_string(cell: &Cell) -> String {
    match cell {
        Cell::Missing | Cell::Null => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) if n.is_finite() => format_number(*n),
        Cell::Number(_) => String::new(),
        Cell::Bool(true) => "TRUE".to_string(),
        Cell::Bool(false) => "FALSE".to_string(),
    }
}

/// Lowercased canonical string, used for email identity keys
pub fn normalize_email(cell: &Cell) -> String {
    normalize_string(cell).to_lowercase()
}

const TRUE_WORDS: [&str; 5] = ["true", "yes", "y", "1", "כן"];
const FALSE_WORDS: [&str; 5] = ["false", "no", "n", "0", "לא"];

/// Boolean reading of a cell.
///
/// Unrecognized text reads as `false`.
pub fn normalize_boolean(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(b) => *b,
        Cell::Number(n) => *n != 0.0 && !n.is_nan(),
        other => {
            let word = normalize_string(other).to_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                true
            } else if FALSE_WORDS.contains(&word.as_str()) {
                false
            } else {
                if !word.is_empty() {
                    tracing::trace!(value = %word, "Unrecognized boolean cell, reading as false");
                }
                false
            }
        }
    }
}

/// Integer millisecond timestamp of a cell, `0` when it cannot be read
pub fn normalize_timestamp_millis(cell: &Cell) -> i64 {
    let value = match cell {
        Cell::Number(n) => *n,
        other => {
            let text = normalize_string(other);
            if text.is_empty() {
                0.0
            } else {
                text.parse::<f64>().unwrap_or(0.0)
            }
        }
    };

    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1.0e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}
