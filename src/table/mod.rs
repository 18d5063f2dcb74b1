//! Canonical tabular model
//!
//! Every export format is normalized into a [`CanonicalTable`]: an ordered
//! sequence of rows sharing one column set. Rows are stored sparsely on the
//! way in (see [`CanonicalTable::push_record`]); a key that a row does not
//! carry is stored as [`Cell::Null`], and a key seen for the first time adds
//! a column that earlier rows read as null.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing or absent value
    Null,
    /// Point in time (UTC)
    Timestamp(DateTime<Utc>),
    /// Numeric value
    Number(f64),
    /// Categorical string value
    Text(String),
}

impl Cell {
    /// Convert a JSON scalar or container into a cell.
    ///
    /// Nested arrays and objects are kept as their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Text(b.to_string()),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Cell::Text(value.to_string()),
        }
    }

    /// Build a timestamp cell from fractional epoch seconds, null when out of range
    pub fn timestamp_secs(secs: f64) -> Self {
        timestamp_from_secs(secs)
            .map(Cell::Timestamp)
            .unwrap_or(Cell::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Column kind this cell implies, `None` for null
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Cell::Null => None,
            Cell::Timestamp(_) => Some(ColumnKind::Timestamp),
            Cell::Number(_) => Some(ColumnKind::Numeric),
            Cell::Text(_) => Some(ColumnKind::Categorical),
        }
    }

    /// Key used when grouping rows by this cell, `None` for null
    pub fn group_key(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Null)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
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

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Timestamp(value)
    }
}

/// Convert fractional epoch seconds into a UTC timestamp
pub fn timestamp_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
}

/// Convert epoch microseconds into a UTC timestamp
pub fn timestamp_from_micros(micros: f64) -> Option<DateTime<Utc>> {
    timestamp_from_secs(micros / 1e6)
}

/// Type of a canonical column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Timestamp,
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Timestamp => write!(f, "timestamp"),
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name, unique within the table
    pub name: String,
    /// Kind fixed by the first non-null cell stored in the column
    pub kind: Option<ColumnKind>,
}

/// Uniform row/column table produced by every format parser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTable {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CanonicalTable {
    /// Create an empty table with no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create an empty table with a fixed leading column order
    pub fn with_columns(name: impl Into<String>, columns: &[&str]) -> Self {
        let mut table = Self::new(name);
        for column in columns {
            table.ensure_column(column);
        }
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column_index(name).and_then(|i| self.columns[i].kind)
    }

    /// Cell at `row` in column `column`
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Append one sparse row.
    ///
    /// Keys not yet present add a new column, back-filled with nulls for
    /// earlier rows. Columns the record does not mention are null. When a key
    /// repeats within one record the last value wins.
    pub fn push_record<I, K>(&mut self, record: I)
    where
        I: IntoIterator<Item = (K, Cell)>,
        K: AsRef<str>,
    {
        let mut row = vec![Cell::Null; self.columns.len()];
        for (key, cell) in record {
            let idx = self.ensure_column(key.as_ref());
            if row.len() <= idx {
                row.resize(idx + 1, Cell::Null);
            }
            let column = &mut self.columns[idx];
            if column.kind.is_none() {
                column.kind = cell.kind();
            }
            row[idx] = cell;
        }
        self.rows.push(row);
    }

    /// Numeric values of a column, `None` when the column does not exist.
    ///
    /// Non-numeric cells read as missing.
    pub fn numeric_values(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r[idx].as_f64()).collect())
    }

    /// Cells of a column, `None` when the column does not exist
    pub fn column_cells(&self, column: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.index.get(name) {
            return *idx;
        }
        let idx = self.columns.len();
        self.columns.push(Column {
            name: name.to_string(),
            kind: None,
        });
        self.index.insert(name.to_string(), idx);
        for row in &mut self.rows {
            row.push(Cell::Null);
        }
        idx
    }
}
