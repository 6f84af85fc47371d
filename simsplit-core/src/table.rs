//! Telemetry table model and the table adapter
//!
//! Ingestion produces a row-major [`RawTable`] straight from the file. The
//! adapter ([`normalize`]) trims the header names, checks that the table is
//! rectangular and turns it into a column-major [`Table`], which is immutable
//! from then on.

use crate::types::{Result, TelemetryError};
use serde::Serialize;

/// A table as produced by an ingestion reader, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Header names exactly as read (may carry surrounding whitespace)
    pub headers: Vec<String>,
    /// Data rows, one cell per header; `None` is an explicit null
    pub rows: Vec<Vec<Option<f64>>>,
}

impl RawTable {
    /// Create a raw table from headers and rows
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Self {
        Self { headers, rows }
    }
}

/// A normalized, column-major telemetry table
///
/// Every column holds exactly one value (or null) per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    rows: usize,
}

impl Table {
    /// Build a table from named columns
    ///
    /// Fails with `MalformedInput` if column lengths differ or a name repeats.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Option<f64>>)>,
        S: Into<String>,
    {
        let mut table = Table::default();
        for (name, values) in columns {
            table.push_column(name.into(), values)?;
        }
        Ok(table)
    }

    fn push_column(&mut self, name: String, values: Vec<Option<f64>>) -> Result<()> {
        if self.names.iter().any(|n| *n == name) {
            return Err(TelemetryError::MalformedInput(format!(
                "duplicate column name '{}'",
                name
            )));
        }
        if self.names.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(TelemetryError::MalformedInput(format!(
                "column '{}' has {} values, expected {}",
                name,
                values.len(),
                self.rows
            )));
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Number of rows (samples)
    pub fn len(&self) -> usize {
        self.rows
    }

    /// True if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in file order
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Get all values of a column, or `None` if the column is absent
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Get a column that must be present, e.g. the progress key
    ///
    /// `table` names the lap in the error message.
    pub fn require_column(&self, name: &str, table: &str) -> Result<&[Option<f64>]> {
        self.column(name).ok_or_else(|| TelemetryError::MissingKey {
            table: table.to_string(),
            column: name.to_string(),
        })
    }

    /// Value at a row position; absent column, null cell and out-of-range row
    /// all read as `None`
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name).and_then(|values| values.get(row).copied().flatten())
    }

    /// All cells of one row, paired with their column names
    pub fn row(&self, row: usize) -> Option<Vec<Cell>> {
        if row >= self.rows {
            return None;
        }
        Some(
            self.names
                .iter()
                .zip(&self.columns)
                .map(|(name, values)| Cell {
                    column: name.clone(),
                    value: values[row],
                })
                .collect(),
        )
    }

    /// Iterate over `(name, values)` pairs in column order
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }
}

/// One named cell of a row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub column: String,
    pub value: Option<f64>,
}

/// Normalize an ingested table
///
/// Strips surrounding whitespace from every column name and transposes the
/// rows into columns. No renaming or type inference happens here. Fails with
/// `MalformedInput` when a row does not have one cell per header, or when two
/// headers are equal after trimming.
pub fn normalize(raw: RawTable) -> Result<Table> {
    let RawTable { headers, rows } = raw;
    let width = headers.len();

    if width == 0 {
        return Err(TelemetryError::MalformedInput(
            "table has no header row".to_string(),
        ));
    }

    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows.len()); width];
    for (idx, row) in rows.into_iter().enumerate() {
        if row.len() != width {
            return Err(TelemetryError::MalformedInput(format!(
                "row {} has {} cells, header has {}",
                idx + 1,
                row.len(),
                width
            )));
        }
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell);
        }
    }

    let names = headers.iter().map(|h| h.trim().to_string());
    let table = Table::from_columns(names.zip(columns))?;

    log::debug!(
        "Normalized table: {} columns, {} rows",
        table.column_names().len(),
        table.len()
    );
    Ok(table)
}
