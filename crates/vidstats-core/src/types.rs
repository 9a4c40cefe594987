//! In-memory tabular model shared by every pipeline stage.
//!
//! A [`Table`] is a header plus rows of dynamically typed [`Value`] cells.
//! Columns are not declared ahead of time; cell types are inferred per column
//! from the text of its fields when an artifact is read.

use std::fmt;

/// Field contents treated as missing when reading an artifact.
pub const MISSING_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Whether a raw field counts as missing.
pub fn is_missing_field(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

/// Infer the cells of one column from its raw CSV fields.
///
/// Missing fields become `Null`. The column is numeric only when every other
/// field parses as a number; otherwise each field is kept verbatim as `Text`,
/// so identifiers like `00042` survive next to `abc`.
pub fn infer_column(fields: &[&str]) -> Vec<Value> {
    let numeric = fields
        .iter()
        .filter(|raw| !is_missing_field(raw))
        .all(|raw| Value::parse_number(raw.trim()).is_some());

    fields
        .iter()
        .map(|raw| {
            if is_missing_field(raw) {
                Value::Null
            } else if numeric {
                Value::parse_number(raw.trim()).unwrap_or(Value::Null)
            } else {
                Value::Text(raw.to_string())
            }
        })
        .collect()
}

impl Value {
    /// Parse trimmed text as an integer, then as a finite float.
    pub fn parse_number(text: &str) -> Option<Self> {
        if let Ok(i) = text.parse::<i64>() {
            return Some(Value::Integer(i));
        }
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Value::Real(f)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. `Text` and `Null` have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Null | Value::Text(_) => None,
        }
    }

    /// The CSV field for this cell. `Null` serializes as an empty field.
    pub fn to_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// An ordered set of named columns and the rows beneath them.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, padding short rows with `Null`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has_column(name))
    }

    /// Append a row, padding with `Null` to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Iterate over one column's cells. Empty if the column does not exist.
    pub fn column_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let idx = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row.get(i)))
    }

    /// Replace the named column's cells, appending the column if absent.
    ///
    /// `values` must have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
                self.columns.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }

    /// Rewrite one column in place with `f`. No-op if the column is absent.
    pub fn map_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&Value) -> Value,
    {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
    }

    /// Keep only the rows for which `keep` returns true. Returns the number dropped.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }
}
