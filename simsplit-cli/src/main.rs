//! SimSplit CLI Application
//!
//! This is the command-line interface for the lap telemetry comparison.
//! It uses the simsplit-core library and adds:
//! - Argument parsing and TOML configuration
//! - Logging setup
//! - Text / JSON reports
//! - Ghost replay and chart series export files

use anyhow::{Context, Result};
use clap::Parser;
use simsplit_core::{DuplicatePolicy, KeyMatch, Lap, Pairing, SessionState, Warning};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat, ZoneMetric};

/// SimSplit - Compare two recorded laps
#[derive(Parser, Debug)]
#[command(name = "simsplit")]
#[command(about = "Align two telemetry laps, detect braking zones and export a ghost replay", long_about = None)]
#[command(version)]
struct Args {
    /// Baseline lap file (CSV/TSV with a LapDistPct column)
    #[arg(short, long, value_name = "FILE")]
    baseline: Option<PathBuf>,

    /// Comparison lap file
    #[arg(long, value_name = "FILE")]
    comparison: Option<PathBuf>,

    /// Path to configuration file (simsplit.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Playback frame to show (clamped to the shorter lap)
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    frame: Option<i64>,

    /// Write the ghost replay JSON to this file
    #[arg(long, value_name = "FILE")]
    ghost_out: Option<PathBuf>,

    /// Write chart series JSON to this file
    #[arg(long, value_name = "FILE")]
    charts_out: Option<PathBuf>,

    /// Row pairing for ghost frames
    #[arg(long, value_enum)]
    pairing: Option<PairingArg>,

    /// Handling of repeated LapDistPct values
    #[arg(long, value_enum)]
    duplicates: Option<DuplicatesArg>,

    /// Match lap distance after rounding to N decimals (default: exact)
    #[arg(long, value_name = "N")]
    round_keys: Option<u32>,

    /// Brake threshold for braking zones
    #[arg(long, value_name = "VALUE")]
    brake_threshold: Option<f64>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Count reported as "braking zones detected"
    #[arg(long, value_enum)]
    zone_metric: Option<ZoneMetric>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PairingArg {
    Position,
    Key,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DuplicatesArg {
    Reject,
    KeepFirst,
    KeepLast,
    CrossProduct,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("SimSplit CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using simsplit-core v{}", simsplit_core::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    let Some(baseline_path) = config.input.baseline.clone() else {
        // No input - show quick start
        println!("SimSplit - No baseline lap specified");
        println!("\nQuick Start:");
        println!("  simsplit --baseline hotlap.csv");
        println!("  simsplit --baseline hotlap.csv --comparison rival.csv --ghost-out ghost.json");
        println!("\nWith a configuration file:");
        println!("  simsplit --config simsplit.toml");
        println!("\nUse --help for more options");
        return Ok(());
    };

    run(&config, &baseline_path)
}

/// Load the laps, analyze the session and write every requested output
fn run(config: &AppConfig, baseline_path: &Path) -> Result<()> {
    let baseline = Lap::from_path(baseline_path)
        .with_context(|| format!("Failed to load baseline lap: {:?}", baseline_path))?;

    let mut session = SessionState::new().with_baseline(baseline);
    let mut load_warnings = Vec::new();

    if let Some(path) = &config.input.comparison {
        match Lap::from_path(path) {
            Ok(lap) => session.set_comparison(lap),
            Err(e) => {
                // Degrade to a baseline-only report
                log::warn!("Failed to load comparison lap {:?}: {}", path, e);
                load_warnings.push(Warning::skipped(format!("Comparison lap {:?}", path), &e));
            }
        }
    }
    session.request_frame(config.input.frame);

    let report = session.analyze(&config.analysis);

    match config.output.format {
        OutputFormat::Txt => {
            let text = report::render_text(
                &report,
                &load_warnings,
                &config.analysis,
                config.output.zone_metric,
                chrono::Utc::now(),
            )?;
            print!("{}", text);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize session report")?;
            println!("{}", json);
        }
    }

    if let Some(path) = &config.output.ghost_file {
        match report.comparison.as_ref().and_then(|c| c.ghost.as_ref()) {
            Some(ghost) => report::write_json(path, ghost)?,
            None => log::warn!("No ghost replay available, {:?} not written", path),
        }
    }

    if let Some(path) = &config.output.charts_file {
        report::write_json(path, &report.charts())?;
    }

    Ok(())
}

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(path) = &args.baseline {
        config.input.baseline = Some(path.clone());
    }
    if let Some(path) = &args.comparison {
        config.input.comparison = Some(path.clone());
    }
    if let Some(frame) = args.frame {
        config.input.frame = Some(frame);
    }
    if let Some(path) = &args.ghost_out {
        config.output.ghost_file = Some(path.clone());
    }
    if let Some(path) = &args.charts_out {
        config.output.charts_file = Some(path.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(metric) = args.zone_metric {
        config.output.zone_metric = metric;
    }
    if let Some(pairing) = args.pairing {
        config.analysis.pairing = match pairing {
            PairingArg::Position => Pairing::Position,
            PairingArg::Key => Pairing::Key,
        };
    }
    if let Some(duplicates) = args.duplicates {
        config.analysis.duplicate_policy = match duplicates {
            DuplicatesArg::Reject => DuplicatePolicy::Reject,
            DuplicatesArg::KeepFirst => DuplicatePolicy::KeepFirst,
            DuplicatesArg::KeepLast => DuplicatePolicy::KeepLast,
            DuplicatesArg::CrossProduct => DuplicatePolicy::CrossProduct,
        };
    }
    if let Some(decimals) = args.round_keys {
        config.analysis.key_match = KeyMatch::Rounded { decimals };
    }
    if let Some(threshold) = args.brake_threshold {
        config.analysis.brake_threshold = threshold;
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "simsplit",
            "--baseline",
            "alice.csv",
            "--frame",
            "-5",
            "--pairing",
            "key",
            "--duplicates",
            "cross-product",
            "--round-keys",
            "3",
            "--brake-threshold",
            "0.3",
        ]);
        let mut config = AppConfig::default();
        config.input.baseline = Some(PathBuf::from("from_file.csv"));

        apply_overrides(&mut config, &args);

        assert_eq!(config.input.baseline, Some(PathBuf::from("alice.csv")));
        assert_eq!(config.input.frame, Some(-5));
        assert_eq!(config.analysis.pairing, Pairing::Key);
        assert_eq!(config.analysis.duplicate_policy, DuplicatePolicy::CrossProduct);
        assert_eq!(config.analysis.key_match, KeyMatch::Rounded { decimals: 3 });
        assert_eq!(config.analysis.brake_threshold, 0.3);
    }

    #[test]
    fn test_run_writes_ghost_file() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = dir.path().join("alice.csv");
        let comparison = dir.path().join("bob.csv");
        std::fs::write(&baseline, "LapDistPct,Speed,Brake\n0,10,0\n50,20,0.5\n").unwrap();
        std::fs::write(&comparison, "LapDistPct,Speed\n0,12\n50,22\n100,30\n").unwrap();

        let mut config = AppConfig::default();
        config.input.comparison = Some(comparison);
        config.output.ghost_file = Some(dir.path().join("ghost.json"));
        config.output.charts_file = Some(dir.path().join("charts.json"));

        run(&config, &baseline).unwrap();

        let ghost: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("ghost.json")).unwrap())
                .unwrap();
        assert_eq!(ghost.as_array().unwrap().len(), 2);
        assert_eq!(ghost[1]["bob"]["speed"], 22.0);
        assert!(dir.path().join("charts.json").exists());
    }

    #[test]
    fn test_run_survives_unreadable_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = dir.path().join("alice.csv");
        std::fs::write(&baseline, "LapDistPct,Speed\n0,10\n").unwrap();

        let mut config = AppConfig::default();
        config.input.comparison = Some(dir.path().join("missing.csv"));

        assert!(run(&config, &baseline).is_ok());
        assert!(run(&config, &dir.path().join("nope.csv")).is_err());
    }
}
