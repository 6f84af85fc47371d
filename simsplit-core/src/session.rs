//! Explicit session state and the full analysis pass
//!
//! A [`SessionState`] holds the loaded laps and the requested playback frame.
//! [`SessionState::analyze`] recomputes every derived view from it. Failures
//! never abort the pass: the affected view is skipped and recorded as a
//! [`Warning`], so a broken comparison lap still leaves the baseline report.

use crate::align::align;
use crate::config::AnalysisConfig;
use crate::cursor::{snapshot, FrameSnapshot, PlaybackCursor};
use crate::events::{EventDetector, EventMarkers, EventZone};
use crate::formats::read_table;
use crate::ghost::{export_ghost, GhostReplay};
use crate::table::{normalize, Table};
use crate::types::{Result, Warning};
use crate::view::{gps_track, speed_comparison_chart, telemetry_chart, ChartData, GpsTrack};
use serde::Serialize;
use std::path::Path;

/// Label used when a path has no usable file stem
const FALLBACK_LABEL: &str = "lap";

/// A labelled, normalized lap recording
#[derive(Debug, Clone, PartialEq)]
pub struct Lap {
    label: String,
    table: Table,
}

impl Lap {
    /// Wrap an already normalized table
    pub fn new(label: impl Into<String>, table: Table) -> Self {
        Self {
            label: label.into(),
            table,
        }
    }

    /// Read and normalize a lap file; the label is the file stem
    pub fn from_path(path: &Path) -> Result<Self> {
        let table = normalize(read_table(path)?)?;
        Ok(Self::new(label_from_path(path), table))
    }

    /// Display label (driver or lap name)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The lap's samples
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if the lap has no samples
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Derive a lap label from a file name (`runs/hotlap.csv` -> `hotlap`)
pub fn label_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_LABEL)
        .to_string()
}

/// Laps currently loaded plus the requested playback frame
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    baseline: Option<Lap>,
    comparison: Option<Lap>,
    requested_frame: Option<i64>,
}

impl SessionState {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the baseline lap
    pub fn with_baseline(mut self, lap: Lap) -> Self {
        self.baseline = Some(lap);
        self
    }

    /// Builder method: set the comparison lap
    pub fn with_comparison(mut self, lap: Lap) -> Self {
        self.comparison = Some(lap);
        self
    }

    /// Builder method: request a playback frame
    pub fn with_frame(mut self, frame: i64) -> Self {
        self.requested_frame = Some(frame);
        self
    }

    /// Replace the baseline lap
    pub fn set_baseline(&mut self, lap: Lap) {
        self.baseline = Some(lap);
    }

    /// Replace the comparison lap
    pub fn set_comparison(&mut self, lap: Lap) {
        self.comparison = Some(lap);
    }

    /// Drop the comparison lap
    pub fn clear_comparison(&mut self) {
        self.comparison = None;
    }

    /// Request a playback frame (`None` returns to the default end frame)
    pub fn request_frame(&mut self, frame: Option<i64>) {
        self.requested_frame = frame;
    }

    /// The baseline lap, if loaded
    pub fn baseline(&self) -> Option<&Lap> {
        self.baseline.as_ref()
    }

    /// The comparison lap, if loaded
    pub fn comparison(&self) -> Option<&Lap> {
        self.comparison.as_ref()
    }

    /// The comparison lap only counts once a baseline is loaded
    fn active_comparison(&self) -> Option<&Lap> {
        self.baseline.as_ref().and(self.comparison.as_ref())
    }

    /// Playback cursor over the active laps at the requested frame
    pub fn cursor(&self) -> Option<PlaybackCursor> {
        let baseline = self.baseline.as_ref()?;
        let cursor = PlaybackCursor::new(baseline.len(), self.active_comparison().map(Lap::len))?;
        Some(match self.requested_frame {
            Some(frame) => cursor.with_frame(frame),
            None => cursor,
        })
    }

    /// Recompute every view from the current state
    pub fn analyze(&self, config: &AnalysisConfig) -> SessionReport {
        let mut warnings = Vec::new();

        let Some(baseline) = self.baseline.as_ref() else {
            if self.comparison.is_some() {
                warnings.push(Warning::ViewSkipped {
                    view: "Comparison".to_string(),
                    reason: "no baseline lap loaded".to_string(),
                });
            }
            return SessionReport {
                warnings,
                ..SessionReport::default()
            };
        };

        let baseline_summary = LapSummary::build(baseline, config, &mut warnings);

        let (comparison_lap, comparison) = match self.active_comparison() {
            Some(other) => {
                let lap_summary = LapSummary::build(other, config, &mut warnings);
                let summary = ComparisonSummary::build(baseline, other, config, &mut warnings);
                (Some(lap_summary), Some(summary))
            }
            None => (None, None),
        };

        let cursor = self.cursor();
        let snapshots = cursor
            .map(|cursor| {
                [Some(baseline), self.active_comparison()]
                    .into_iter()
                    .flatten()
                    .filter_map(|lap| snapshot(lap.table(), lap.label(), cursor.frame()))
                    .collect()
            })
            .unwrap_or_default();

        for warning in &warnings {
            log::warn!("{}", warning);
        }

        SessionReport {
            baseline: Some(baseline_summary),
            comparison_lap,
            comparison,
            frame: cursor.map(|c| c.frame()),
            frame_count: cursor.map_or(0, |c| c.len()),
            snapshots,
            warnings,
        }
    }
}

/// Per-lap results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapSummary {
    pub label: String,
    pub rows: usize,
    pub braking: Option<EventMarkers>,
    pub braking_zones: Vec<EventZone>,
    pub acceleration: Option<EventMarkers>,
    pub chart: Option<ChartData>,
    pub gps: Option<GpsTrack>,
}

impl LapSummary {
    fn build(lap: &Lap, config: &AnalysisConfig, warnings: &mut Vec<Warning>) -> Self {
        let key = config.key_column.as_str();
        let label = lap.label();

        let braking_detector = EventDetector::braking_from(config);
        let braking = match braking_detector.detect(lap.table(), label, key) {
            Ok(markers) => Some(markers),
            Err(e) => {
                warnings.push(Warning::skipped(format!("{} braking zones", label), &e));
                None
            }
        };
        let acceleration_detector = EventDetector::acceleration_from(config);
        let acceleration = match acceleration_detector.detect(lap.table(), label, key) {
            Ok(markers) => Some(markers),
            Err(e) => {
                warnings.push(Warning::skipped(format!("{} acceleration zones", label), &e));
                None
            }
        };
        let braking_zones = braking
            .as_ref()
            .map(|m| m.contiguous_zones(config.zone_gap))
            .unwrap_or_default();

        let chart = match telemetry_chart(lap.table(), label, key, braking.as_ref(), warnings) {
            Ok(chart) => Some(chart),
            Err(e) => {
                warnings.push(Warning::skipped(format!("{} telemetry chart", label), &e));
                None
            }
        };

        Self {
            label: label.to_string(),
            rows: lap.len(),
            braking,
            braking_zones,
            acceleration,
            chart,
            gps: gps_track(lap.table(), label),
        }
    }

    /// Samples above the braking threshold
    pub fn braking_sample_count(&self) -> usize {
        self.braking.as_ref().map_or(0, EventMarkers::sample_hit_count)
    }

    /// Contiguous braking zones
    pub fn braking_zone_count(&self) -> usize {
        self.braking_zones.len()
    }
}

/// Results that need both laps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub baseline: String,
    pub comparison: String,
    pub aligned_rows: usize,
    pub chart: Option<ChartData>,
    pub ghost: Option<GhostReplay>,
}

impl ComparisonSummary {
    fn build(a: &Lap, b: &Lap, config: &AnalysisConfig, warnings: &mut Vec<Warning>) -> Self {
        let (aligned_rows, chart) = match align(a.table(), a.label(), b.table(), b.label(), config)
        {
            Ok(aligned) => {
                if aligned.is_empty() {
                    warnings.push(Warning::NoOverlap {
                        baseline: a.label().to_string(),
                        comparison: b.label().to_string(),
                    });
                }
                (aligned.len(), Some(speed_comparison_chart(&aligned, warnings)))
            }
            Err(e) => {
                warnings.push(Warning::skipped("Speed comparison", &e));
                (0, None)
            }
        };

        let ghost = match export_ghost(a.table(), a.label(), b.table(), b.label(), config) {
            Ok(replay) => Some(replay),
            Err(e) => {
                warnings.push(Warning::skipped("Ghost replay", &e));
                None
            }
        };

        Self {
            baseline: a.label().to_string(),
            comparison: b.label().to_string(),
            aligned_rows,
            chart,
            ghost,
        }
    }
}

/// Everything derived from one session state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    pub baseline: Option<LapSummary>,
    pub comparison_lap: Option<LapSummary>,
    pub comparison: Option<ComparisonSummary>,
    pub frame: Option<usize>,
    pub frame_count: usize,
    pub snapshots: Vec<FrameSnapshot>,
    pub warnings: Vec<Warning>,
}

impl SessionReport {
    /// Chart views in display order, for the rendering layer
    pub fn charts(&self) -> Vec<&ChartData> {
        let mut charts: Vec<&ChartData> = Vec::new();
        charts.extend(self.baseline.as_ref().and_then(|s| s.chart.as_ref()));
        charts.extend(self.comparison.as_ref().and_then(|c| c.chart.as_ref()));
        charts.extend(self.comparison_lap.as_ref().and_then(|s| s.chart.as_ref()));
        charts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;

    fn lap(label: &str, rows: usize, with_brake: bool) -> Lap {
        let keys: Vec<Option<f64>> = (0..rows).map(|i| Some(i as f64)).collect();
        let speed: Vec<Option<f64>> = (0..rows).map(|i| Some(100.0 + i as f64)).collect();
        let mut columns = vec![("LapDistPct", keys), ("Speed", speed)];
        if with_brake {
            columns.push((
                "Brake",
                (0..rows).map(|i| Some(if i % 10 < 2 { 0.8 } else { 0.0 })).collect(),
            ));
        }
        Lap::new(label, Table::from_columns(columns).unwrap())
    }

    #[test]
    fn test_label_from_path() {
        assert_eq!(label_from_path(Path::new("runs/hotlap.csv")), "hotlap");
        assert_eq!(label_from_path(Path::new("/")), "lap");
    }

    #[test]
    fn test_empty_session() {
        let report = SessionState::new().analyze(&AnalysisConfig::default());
        assert!(report.baseline.is_none());
        assert!(report.frame.is_none());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_baseline_only() {
        let session = SessionState::new().with_baseline(lap("base", 30, true));
        let report = session.analyze(&AnalysisConfig::default());

        let summary = report.baseline.as_ref().unwrap();
        assert_eq!(summary.braking_sample_count(), 6);
        assert_eq!(summary.braking_zone_count(), 3);
        assert!(report.comparison.is_none());
        assert_eq!(report.frame, Some(29));
        assert_eq!(report.snapshots.len(), 1);
    }

    #[test]
    fn test_comparison_uses_shorter_lap_for_frames() {
        let session = SessionState::new()
            .with_baseline(lap("base", 100, true))
            .with_comparison(lap("rival", 60, false))
            .with_frame(80);
        let report = session.analyze(&AnalysisConfig::default());

        assert_eq!(report.frame, Some(59));
        assert_eq!(report.frame_count, 60);
        assert_eq!(report.snapshots.len(), 2);

        let comparison = report.comparison.as_ref().unwrap();
        assert_eq!(comparison.aligned_rows, 60);
        assert_eq!(comparison.ghost.as_ref().unwrap().len(), 60);
        assert_eq!(report.charts().len(), 3);
    }

    #[test]
    fn test_comparison_failure_degrades_to_baseline() {
        let broken = Lap::new(
            "broken",
            Table::from_columns(vec![("Speed", vec![Some(1.0), Some(2.0)])]).unwrap(),
        );
        let session = SessionState::new()
            .with_baseline(lap("base", 10, true))
            .with_comparison(broken);
        let report = session.analyze(&AnalysisConfig::default());

        assert!(report.baseline.as_ref().unwrap().chart.is_some());
        let comparison = report.comparison.as_ref().unwrap();
        assert!(comparison.chart.is_none());
        // Position pairing does not need the key
        assert_eq!(comparison.ghost.as_ref().unwrap().len(), 2);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::ViewSkipped { view, .. } if view == "Speed comparison")));
    }

    #[test]
    fn test_rejected_duplicates_are_warnings() {
        let dup = Lap::new(
            "dup",
            Table::from_columns(vec![
                ("LapDistPct", vec![Some(0.0), Some(0.0)]),
                ("Speed", vec![Some(1.0), Some(2.0)]),
            ])
            .unwrap(),
        );
        let config = AnalysisConfig::new().with_duplicate_policy(DuplicatePolicy::Reject);
        let report = SessionState::new()
            .with_baseline(lap("base", 5, false))
            .with_comparison(dup)
            .analyze(&config);

        assert_eq!(report.comparison.as_ref().unwrap().aligned_rows, 0);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_comparison_without_baseline_is_skipped() {
        let mut session = SessionState::new();
        session.set_comparison(lap("rival", 5, false));
        let report = session.analyze(&AnalysisConfig::default());

        assert!(report.comparison.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert!(session.cursor().is_none());
    }

    #[test]
    fn test_request_frame_and_clear() {
        let mut session = SessionState::new()
            .with_baseline(lap("base", 20, false))
            .with_comparison(lap("rival", 10, false));
        session.request_frame(Some(-4));
        assert_eq!(session.cursor().unwrap().frame(), 0);

        session.clear_comparison();
        session.request_frame(None);
        assert_eq!(session.cursor().unwrap().frame(), 19);
    }
}
