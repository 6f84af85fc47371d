//! Report generation
//!
//! Renders a [`SessionReport`] as plain text, and writes the JSON exports
//! (ghost replay, chart series, full report).

use crate::config::ZoneMetric;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use simsplit_core::{AnalysisConfig, LapSummary, SessionReport, Warning};
use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

const RULE: &str = "═══════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────";

/// Render the text report
///
/// `extra_warnings` are problems found before analysis (e.g. an unreadable
/// comparison file) and are listed with the session's own warnings.
pub fn render_text(
    report: &SessionReport,
    extra_warnings: &[Warning],
    config: &AnalysisConfig,
    zone_metric: ZoneMetric,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let mut out = String::new();
    write_report(&mut out, report, extra_warnings, config, zone_metric, generated_at)
        .context("Failed to render text report")?;
    Ok(out)
}

fn write_report<W: Write>(
    out: &mut W,
    report: &SessionReport,
    extra_warnings: &[Warning],
    config: &AnalysisConfig,
    zone_metric: ZoneMetric,
    generated_at: DateTime<Utc>,
) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  SimSplit • Lap Telemetry Report")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;

    if let Some(baseline) = &report.baseline {
        writeln!(out, "\n📊 {} Baseline Lap Telemetry", baseline.label)?;
        write_lap(out, baseline, config, zone_metric)?;
    }

    if let Some(comparison) = &report.comparison {
        writeln!(
            out,
            "\n🔁 Telemetry Comparison: {} vs. {}",
            comparison.baseline, comparison.comparison
        )?;
        writeln!(out, "{}", THIN_RULE)?;
        writeln!(out, "  Aligned rows:     {}", comparison.aligned_rows)?;
        match &comparison.ghost {
            Some(ghost) => writeln!(
                out,
                "  Ghost frames:     {} ({:?} pairing)",
                ghost.len(),
                config.pairing
            )?,
            None => writeln!(out, "  Ghost frames:     unavailable")?,
        }
    }

    if let Some(lap) = &report.comparison_lap {
        writeln!(out, "\n📊 {} Comparison Lap Telemetry", lap.label)?;
        write_lap(out, lap, config, zone_metric)?;
    }

    if let Some(frame) = report.frame {
        writeln!(
            out,
            "\n⏱  Playback frame {} of {} (0..{})",
            frame,
            report.frame_count,
            report.frame_count.saturating_sub(1)
        )?;
        for snap in &report.snapshots {
            let cells: Vec<String> = snap
                .cells
                .iter()
                .map(|cell| format!("{}={}", cell.column, format_value(cell.value)))
                .collect();
            writeln!(out, "  {}: {}", snap.label, cells.join("  "))?;
        }
    }

    let warnings: Vec<&Warning> = extra_warnings.iter().chain(&report.warnings).collect();
    if !warnings.is_empty() {
        writeln!(out, "\n⚠️  Warnings ({})", warnings.len())?;
        for warning in warnings {
            writeln!(out, "  • {}", warning)?;
        }
    }

    Ok(())
}

fn write_lap<W: Write>(
    out: &mut W,
    lap: &LapSummary,
    config: &AnalysisConfig,
    metric: ZoneMetric,
) -> fmt::Result {
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(out, "  Samples:          {}", lap.rows)?;

    match &lap.braking {
        Some(braking) => {
            writeln!(
                out,
                "  Braking samples:  {} (Brake > {})",
                braking.sample_hit_count(),
                braking.threshold()
            )?;
            writeln!(
                out,
                "  Braking zones:    {} (gap ≤ {} %)",
                lap.braking_zone_count(),
                config.zone_gap
            )?;
            let headline = match metric {
                ZoneMetric::Samples => lap.braking_sample_count(),
                ZoneMetric::Contiguous => lap.braking_zone_count(),
            };
            writeln!(out, "  {} braking zones detected in {}.", headline, lap.label)?;
        }
        None => writeln!(out, "  Braking zones:    unavailable")?,
    }

    if let Some(acceleration) = &lap.acceleration {
        writeln!(
            out,
            "  Full throttle:    {} samples (Throttle > {})",
            acceleration.sample_hit_count(),
            acceleration.threshold()
        )?;
    }
    writeln!(
        out,
        "  GPS line:         {}",
        if lap.gps.is_some() { "yes" } else { "no" }
    )
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => "null".to_string(),
    }
}

/// Write a JSON payload to a file
pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    log::info!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use simsplit_core::{Lap, SessionState, Table};

    fn lap(label: &str, brake: Vec<Option<f64>>) -> Lap {
        let keys = (0..brake.len()).map(|i| Some(i as f64 * 0.5)).collect();
        let speed = (0..brake.len()).map(|i| Some(100.0 + i as f64)).collect();
        let table = Table::from_columns(vec![
            ("LapDistPct", keys),
            ("Speed", speed),
            ("Brake", brake),
        ])
        .unwrap();
        Lap::new(label, table)
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        // Three adjacent braking samples form one zone
        let brake = vec![Some(0.0), Some(0.5), Some(0.6), Some(0.7), Some(0.0)];
        let report = SessionState::new()
            .with_baseline(lap("alice", brake.clone()))
            .with_comparison(lap("bob", brake))
            .analyze(&AnalysisConfig::default());

        let text = render_text(
            &report,
            &[],
            &AnalysisConfig::default(),
            ZoneMetric::Samples,
            generated_at(),
        )
        .unwrap();

        assert!(text.contains("Generated: 2024-05-01 12:00:00 UTC"));
        assert!(text.contains("📊 alice Baseline Lap Telemetry"));
        assert!(text.contains("3 braking zones detected in alice."));
        assert!(text.contains("Braking zones:    1"));
        assert!(text.contains("Telemetry Comparison: alice vs. bob"));
        assert!(text.contains("Aligned rows:     5"));
        assert!(text.contains("Playback frame 4 of 5"));
        assert!(text.contains("Warnings"));
    }

    #[test]
    fn test_contiguous_headline() {
        let brake = vec![Some(0.5), Some(0.5), Some(0.0)];
        let report = SessionState::new()
            .with_baseline(lap("alice", brake))
            .analyze(&AnalysisConfig::default());

        let text = render_text(
            &report,
            &[],
            &AnalysisConfig::default(),
            ZoneMetric::Contiguous,
            generated_at(),
        )
        .unwrap();
        assert!(text.contains("1 braking zones detected in alice."));
        assert!(!text.contains("Telemetry Comparison"));
    }

    #[test]
    fn test_extra_warnings_listed_first() {
        let report = SessionReport::default();
        let extra = vec![Warning::ViewSkipped {
            view: "Comparison lap".to_string(),
            reason: "IO error".to_string(),
        }];
        let text = render_text(
            &report,
            &extra,
            &AnalysisConfig::default(),
            ZoneMetric::Samples,
            generated_at(),
        )
        .unwrap();
        assert!(text.contains("Warnings (1)"));
        assert!(text.contains("Comparison lap skipped: IO error"));
    }

    struct FullBuffer;

    impl fmt::Write for FullBuffer {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn test_write_errors_propagate() {
        let report = SessionState::new()
            .with_baseline(lap("alice", vec![Some(0.5)]))
            .analyze(&AnalysisConfig::default());

        let result = write_report(
            &mut FullBuffer,
            &report,
            &[],
            &AnalysisConfig::default(),
            ZoneMetric::Samples,
            generated_at(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('2'));
    }
}
