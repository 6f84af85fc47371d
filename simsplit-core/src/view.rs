//! Chart-ready series for the rendering layer
//!
//! Nothing here draws. Each view is a flat set of named series on a shared
//! x-axis plus optional marker positions, ready to be serialized and handed
//! to whatever plots them.

use crate::align::{suffixed, AlignedTable};
use crate::events::EventMarkers;
use crate::table::Table;
use crate::types::{columns, Result, Warning};
use serde::Serialize;

/// Axis label for the progress key
const LAP_PCT_LABEL: &str = "Lap %";

/// One named series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Series sharing one x-axis, with optional highlight positions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub x_label: String,
    pub x: Vec<Option<f64>>,
    pub series: Vec<Series>,
    /// x positions to highlight (e.g. braking markers)
    pub markers: Vec<f64>,
}

impl ChartData {
    /// Look up a series by name
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// GPS driving line of one lap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsTrack {
    pub title: String,
    pub lat: Vec<Option<f64>>,
    pub lon: Vec<Option<f64>>,
}

/// Input traces of one lap against lap distance
///
/// Plots `Speed`, `Throttle`, `Brake` and `Steering`; each absent trace is
/// skipped with a `MissingColumn` warning. Fails with `MissingKey` when the
/// lap has no key column.
pub fn telemetry_chart(
    table: &Table,
    label: &str,
    key_column: &str,
    markers: Option<&EventMarkers>,
    warnings: &mut Vec<Warning>,
) -> Result<ChartData> {
    let x = table.require_column(key_column, label)?.to_vec();

    let mut series = Vec::new();
    for name in columns::INPUT_TRACES {
        match table.column(name) {
            Some(values) => series.push(Series {
                name: name.to_string(),
                values: values.to_vec(),
            }),
            None => {
                log::debug!("{}: no '{}' column, trace skipped", label, name);
                warnings.push(Warning::MissingColumn {
                    lap: label.to_string(),
                    column: name.to_string(),
                });
            }
        }
    }

    Ok(ChartData {
        title: format!("{} • Inputs vs. Lap %", label),
        x_label: LAP_PCT_LABEL.to_string(),
        x,
        series,
        markers: markers.map(|m| m.keys().to_vec()).unwrap_or_default(),
    })
}

/// Speed of both laps over the aligned key
///
/// A lap without a `Speed` column is left out with a `MissingColumn`
/// warning.
pub fn speed_comparison_chart(aligned: &AlignedTable, warnings: &mut Vec<Warning>) -> ChartData {
    let (label_a, label_b) = aligned.labels();

    let mut series = Vec::new();
    for label in [label_a, label_b] {
        match aligned.series(columns::SPEED, label) {
            Some(values) => series.push(Series {
                name: suffixed(columns::SPEED, label),
                values: values.to_vec(),
            }),
            None => warnings.push(Warning::MissingColumn {
                lap: label.to_string(),
                column: columns::SPEED.to_string(),
            }),
        }
    }

    ChartData {
        title: "Speed Comparison".to_string(),
        x_label: LAP_PCT_LABEL.to_string(),
        x: aligned.keys().to_vec(),
        series,
        markers: Vec::new(),
    }
}

/// The lap's GPS line, if it has both `Lat` and `Lon`
pub fn gps_track(table: &Table, label: &str) -> Option<GpsTrack> {
    let lat = table.column(columns::LAT)?;
    let lon = table.column(columns::LON)?;
    Some(GpsTrack {
        title: format!("{} • GPS Driving Line", label),
        lat: lat.to_vec(),
        lon: lon.to_vec(),
    })
}
