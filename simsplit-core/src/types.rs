//! Core types for the telemetry comparison library
//!
//! This module defines the error type, the non-fatal warnings emitted while
//! building views, and the well-known telemetry column names.

use serde::Serialize;
use std::fmt;

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Well-known telemetry column names (after header trimming)
pub mod columns {
    /// Shared progress key, percentage of lap distance completed
    pub const LAP_DIST_PCT: &str = "LapDistPct";
    pub const SPEED: &str = "Speed";
    pub const THROTTLE: &str = "Throttle";
    pub const BRAKE: &str = "Brake";
    pub const STEERING: &str = "Steering";
    pub const STEERING_WHEEL_ANGLE: &str = "SteeringWheelAngle";
    pub const LAT: &str = "Lat";
    pub const LON: &str = "Lon";

    /// Input traces plotted for a single lap, in display order
    pub const INPUT_TRACES: [&str; 4] = [SPEED, THROTTLE, BRAKE, STEERING];
}

/// Errors that can occur while ingesting or comparing laps
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Missing key column '{column}' in {table}")]
    MissingKey { table: String, column: String },

    #[error("Duplicate key {key} in {table} (column '{column}')")]
    DuplicateKey {
        table: String,
        column: String,
        key: f64,
    },

    #[error("Label conflict: {0}")]
    LabelConflict(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A non-fatal condition found while building a view
///
/// Warnings never abort an analysis: the affected series or view is skipped
/// and the rest of the session is still produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An optional signal column is absent; its series was left out
    MissingColumn { lap: String, column: String },

    /// A whole view could not be computed
    ViewSkipped { view: String, reason: String },

    /// Both laps were readable but no key value matched
    NoOverlap { baseline: String, comparison: String },
}

impl Warning {
    /// Build a `ViewSkipped` warning from the error that prevented the view
    pub fn skipped(view: impl Into<String>, error: &TelemetryError) -> Self {
        Warning::ViewSkipped {
            view: view.into(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingColumn { lap, column } => {
                write!(f, "{}: column '{}' not found, series skipped", lap, column)
            }
            Warning::ViewSkipped { view, reason } => write!(f, "{} skipped: {}", view, reason),
            Warning::NoOverlap {
                baseline,
                comparison,
            } => write!(
                f,
                "{} and {} share no lap distance values, comparison is empty",
                baseline, comparison
            ),
        }
    }
}
