//! Threshold event detection (braking and acceleration)
//!
//! Every sample whose signal is strictly above the threshold is a hit. There
//! is no smoothing or debounce, so a braking zone of N samples yields N
//! markers. [`EventMarkers::contiguous_zones`] groups the hits into zones
//! separately, so callers can report either number.

use crate::config::AnalysisConfig;
use crate::table::Table;
use crate::types::{columns, Result};
use serde::Serialize;

/// Signal column and trigger threshold for one kind of event
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetector {
    pub column: String,
    pub threshold: f64,
}

impl EventDetector {
    /// Detector for an arbitrary column
    pub fn new(column: impl Into<String>, threshold: f64) -> Self {
        Self {
            column: column.into(),
            threshold,
        }
    }

    /// `Brake > 0.1`
    pub fn braking() -> Self {
        Self::new(columns::BRAKE, 0.1)
    }

    /// `Throttle > 0.9`
    pub fn acceleration() -> Self {
        Self::new(columns::THROTTLE, 0.9)
    }

    /// Builder method: override the threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Braking detector using the configured threshold
    pub fn braking_from(config: &AnalysisConfig) -> Self {
        Self::braking().with_threshold(config.brake_threshold)
    }

    /// Acceleration detector using the configured threshold
    pub fn acceleration_from(config: &AnalysisConfig) -> Self {
        Self::acceleration().with_threshold(config.throttle_threshold)
    }

    /// Run the detector over the lap `label`, keyed by `key_column`
    pub fn detect(&self, table: &Table, label: &str, key_column: &str) -> Result<EventMarkers> {
        detect_events(table, label, key_column, &self.column, self.threshold)
    }
}

/// Key values of every sample where a signal exceeded its threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMarkers {
    column: String,
    threshold: f64,
    keys: Vec<f64>,
    #[serde(skip)]
    rows: Vec<usize>,
}

impl EventMarkers {
    fn empty(column: &str, threshold: f64) -> Self {
        Self {
            column: column.to_string(),
            threshold,
            keys: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Signal column the markers were computed from
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Trigger threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Marker key values, in table order
    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    /// Row positions of the markers, in table order
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// True if no sample exceeded the threshold
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of individual samples above the threshold
    ///
    /// This is the figure historically reported as "zones detected".
    pub fn sample_hit_count(&self) -> usize {
        self.keys.len()
    }

    /// Group hits into zones
    ///
    /// Keys are sorted; a new zone starts whenever the distance to the
    /// previous key is greater than `max_gap`.
    pub fn contiguous_zones(&self, max_gap: f64) -> Vec<EventZone> {
        let mut sorted = self.keys.clone();
        sorted.sort_by(f64::total_cmp);

        let mut zones: Vec<EventZone> = Vec::new();
        for key in sorted {
            match zones.last_mut() {
                Some(zone) if key - zone.end <= max_gap => {
                    zone.end = key;
                    zone.samples += 1;
                }
                _ => zones.push(EventZone {
                    start: key,
                    end: key,
                    samples: 1,
                }),
            }
        }
        zones
    }

    /// Number of zones produced by [`Self::contiguous_zones`]
    pub fn contiguous_zone_count(&self, max_gap: f64) -> usize {
        self.contiguous_zones(max_gap).len()
    }
}

/// A run of hits with no gap larger than the grouping tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventZone {
    pub start: f64,
    pub end: f64,
    pub samples: usize,
}

/// Collect the key of every sample where `column > threshold`
///
/// An absent signal column yields empty markers. Null cells never trigger,
/// and rows with a null key are skipped. Fails with `MissingKey` only when
/// the signal exists but `key_column` does not; the error names `label`.
pub fn detect_events(
    table: &Table,
    label: &str,
    key_column: &str,
    column: &str,
    threshold: f64,
) -> Result<EventMarkers> {
    let Some(values) = table.column(column) else {
        log::debug!("Column '{}' not present, no events", column);
        return Ok(EventMarkers::empty(column, threshold));
    };
    let keys = table.require_column(key_column, label)?;

    let mut markers = EventMarkers::empty(column, threshold);
    for (row, (value, key)) in values.iter().zip(keys).enumerate() {
        match (value, key) {
            (Some(value), Some(key)) if *value > threshold => {
                markers.keys.push(*key);
                markers.rows.push(row);
            }
            (Some(value), None) if *value > threshold => {
                log::trace!("Row {} above threshold but has no key", row);
            }
            _ => {}
        }
    }

    log::debug!(
        "{} > {}: {} samples",
        column,
        threshold,
        markers.sample_hit_count()
    );
    Ok(markers)
}
