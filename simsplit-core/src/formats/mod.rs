//! Lap file readers
//!
//! This module turns exported lap files into [`RawTable`]s. Readers do not
//! trim or validate column names; that is the table adapter's job
//! ([`crate::table::normalize`]).

use crate::table::RawTable;
use crate::types::{Result, TelemetryError};
use std::path::Path;

pub mod delimited;

// Re-export reader types
pub use delimited::DelimitedReader;

/// Read a lap file, choosing the reader from the file extension
///
/// `.csv` is comma separated, `.tsv` and `.txt` are tab separated.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("csv") => {
            log::debug!("Detected CSV file format");
            DelimitedReader::new(b',').read_path(path)
        }
        Some("tsv") | Some("txt") => {
            log::debug!("Detected tab-separated file format");
            DelimitedReader::new(b'\t').read_path(path)
        }
        _ => Err(TelemetryError::UnsupportedFormat(format!(
            "{:?} (expected .csv, .tsv or .txt)",
            path
        ))),
    }
}
