//! In-memory record table.
//!
//! A [`Table`] is a column-oriented, immutable tabular dataset. Every
//! transformation in the crate returns a new table; the input is never
//! modified. Cells are loosely typed ([`Cell`]): numeric, text, or null,
//! matching what a freshly parsed CSV can actually promise.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::{TableError, TableResult};

// =============================================================================
// Cell
// =============================================================================

/// A single table cell.
///
/// Serializes untagged, so a cell renders as a bare JSON number, string,
/// or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    Null,
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl Cell {
    /// Numeric value, if this cell holds one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text value, if this cell holds one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, but only when strictly positive.
    ///
    /// Used wherever a value is about to become a divisor.
    pub fn as_positive(&self) -> Option<f64> {
        self.as_number().filter(|n| *n > 0.0)
    }

    /// True for [`Cell::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Parse a text cell into a number, leaving numbers untouched.
    ///
    /// Unparseable text becomes [`Cell::Null`], mirroring a lossy
    /// to-numeric coercion.
    pub fn to_number(&self) -> Cell {
        match self {
            Cell::Number(n) => Cell::Number(*n),
            Cell::Text(s) => match s.trim().replace(',', "").parse::<f64>() {
                Ok(n) if n.is_finite() => Cell::Number(n),
                _ => Cell::Null,
            },
            Cell::Null => Cell::Null,
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Option<f64>> for Cell {
    fn from(n: Option<f64>) -> Self {
        match n {
            Some(n) => Cell::Number(n),
            None => Cell::Null,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, ""),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{:.2}", n)
                }
            }
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Column-oriented record table.
///
/// Invariant: every column holds exactly `row_count` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<Cell>>,
    row_count: usize,
}

impl Table {
    /// Empty table with no columns and no rows.
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Build a table from named columns.
    ///
    /// All columns must share the same length; the first column fixes the
    /// row count.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Cell>)>) -> TableResult<Self> {
        let mut table = Table::new();
        let mut row_count = None;

        for (name, cells) in columns {
            let name = name.into();
            let expected = *row_count.get_or_insert(cells.len());
            if cells.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: name,
                    len: cells.len(),
                    expected,
                });
            }
            table.headers.push(name);
            table.columns.push(cells);
        }

        table.row_count = row_count.unwrap_or(0);
        Ok(table)
    }

    /// Column headers in table order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// True when a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Cells of a column by name.
    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.column_index(name).map(|i| self.columns[i].as_slice())
    }

    /// Cells of a column by name, erroring when absent.
    pub fn require_column(&self, name: &str) -> TableResult<&[Cell]> {
        self.column(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// New table with a column added (or replaced when the name exists).
    ///
    /// The input table is left untouched.
    pub fn with_column(
        &self,
        name: impl Into<String>,
        cells: Vec<Cell>,
    ) -> TableResult<Table> {
        let name = name.into();
        if cells.len() != self.row_count {
            return Err(TableError::LengthMismatch {
                column: name,
                len: cells.len(),
                expected: self.row_count,
            });
        }

        let mut out = self.clone();
        match out.column_index(&name) {
            Some(i) => out.columns[i] = cells,
            None => {
                out.headers.push(name);
                out.columns.push(cells);
            }
        }
        Ok(out)
    }

    /// New table keeping only rows where `keep` returns true.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let kept: Vec<usize> = (0..self.row_count).filter(|&i| keep(i)).collect();

        let columns = self
            .columns
            .iter()
            .map(|col| kept.iter().map(|&i| col[i].clone()).collect())
            .collect();

        Table {
            headers: self.headers.clone(),
            columns,
            row_count: kept.len(),
        }
    }

    /// New table containing only the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.filter_rows(|i| i < n)
    }

    /// New table with exact duplicate rows removed (first occurrence kept).
    pub fn drop_duplicates(&self) -> Table {
        let mut seen: HashSet<String> = HashSet::new();
        let mut keep = vec![false; self.row_count];

        for i in 0..self.row_count {
            let mut key = String::new();
            for col in &self.columns {
                key.push_str(&format!("{:?}\u{1f}", col[i]));
            }
            if seen.insert(key) {
                keep[i] = true;
            }
        }

        self.filter_rows(|i| keep[i])
    }

    /// Rows as JSON objects, keyed by header.
    ///
    /// This is the shape written by the CLI's `--output`.
    pub fn to_rows_json(&self) -> Vec<Value> {
        (0..self.row_count)
            .map(|i| {
                let mut obj = Map::new();
                for (h, col) in self.headers.iter().zip(&self.columns) {
                    obj.insert(h.clone(), json!(col[i]));
                }
                Value::Object(obj)
            })
            .collect()
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

impl fmt::Display for Table {
    /// Plain-text rendering with aligned columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        let rendered: Vec<Vec<String>> = (0..self.row_count)
            .map(|i| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(c, col)| {
                        let s = col[i].to_string();
                        widths[c] = widths[c].max(s.len());
                        s
                    })
                    .collect()
            })
            .collect();

        for (c, h) in self.headers.iter().enumerate() {
            if c > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{:<width$}", h, width = widths[c])?;
        }
        writeln!(f)?;

        for row in &rendered {
            for (c, s) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:<width$}", s, width = widths[c])?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
