//! Delimited text reader (CSV / TSV)
//!
//! Expects a header row followed by numeric cells. Empty cells and the
//! usual null spellings (`NaN`, `null`, `NA`, `None`) become explicit nulls.
//! Rows are read as-is even when their length differs from the header so the
//! table adapter can report the ragged row.

use crate::table::RawTable;
use crate::types::{Result, TelemetryError};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Null spellings accepted in numeric cells (compared case-insensitively)
const NULL_TOKENS: [&str; 5] = ["nan", "null", "na", "none", "n/a"];

/// Reader for delimiter-separated lap exports
#[derive(Debug, Clone, Copy)]
pub struct DelimitedReader {
    delimiter: u8,
}

impl DelimitedReader {
    /// Create a reader for the given delimiter byte
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read a file from disk
    pub fn read_path(&self, path: &Path) -> Result<RawTable> {
        log::info!("Reading lap file: {:?}", path);
        let file = File::open(path)?;
        let table = self.read(BufReader::new(file))?;
        log::info!(
            "Read {:?}: {} columns, {} rows",
            path,
            table.headers.len(),
            table.rows.len()
        );
        Ok(table)
    }

    /// Read from any byte stream
    pub fn read<R: Read>(&self, reader: R) -> Result<RawTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(parse_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.map_err(parse_error)?;
            let row = record
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    parse_cell(cell).ok_or_else(|| {
                        TelemetryError::MalformedInput(format!(
                            "row {}, column '{}': '{}' is not a number",
                            idx + 1,
                            headers.get(col).map(|h| h.trim()).unwrap_or("?"),
                            cell
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        Ok(RawTable::new(headers, rows))
    }
}

/// Undecodable text is malformed input; only real read failures stay I/O errors
fn parse_error(err: csv::Error) -> TelemetryError {
    let reason = err.to_string();
    let line = err.position().map(|pos| pos.line());
    match err.into_kind() {
        csv::ErrorKind::Io(io) => TelemetryError::IoError(io),
        _ => match line {
            Some(line) => TelemetryError::MalformedInput(format!("line {}: {}", line, reason)),
            None => TelemetryError::MalformedInput(reason),
        },
    }
}

/// Parse one cell: `Some(None)` is a null, `None` means not a number
fn parse_cell(cell: &str) -> Option<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || NULL_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t)) {
        return Some(None);
    }
    cell.parse::<f64>().ok().map(Some)
}
