//! SimSplit telemetry comparison library
//!
//! A stateless library for comparing two recorded laps (a baseline and a
//! comparison) sampled against lap distance percentage.
//!
//! # Architecture
//!
//! - Reads delimited lap exports and normalizes them into immutable tables
//! - Joins two laps on `LapDistPct` with an explicit key matching and
//!   duplicate policy
//! - Detects braking and acceleration samples by threshold, and groups them
//!   into zones
//! - Clamps a playback frame across laps of different lengths
//! - Exports a frame-indexed ghost replay for synchronized playback
//! - Produces chart-ready series for an external renderer
//!
//! The library does NOT draw charts, handle uploads or capture live
//! telemetry. Session state is an explicit value ([`SessionState`]) passed
//! to each computation.
//!
//! # Example Usage
//!
//! ```no_run
//! use simsplit_core::{AnalysisConfig, Lap, Pairing, SessionState};
//! use std::path::Path;
//!
//! let baseline = Lap::from_path(Path::new("hotlap.csv")).unwrap();
//! let rival = Lap::from_path(Path::new("rival.csv")).unwrap();
//!
//! let config = AnalysisConfig::new()
//!     .with_brake_threshold(0.1)
//!     .with_pairing(Pairing::Position);
//!
//! let report = SessionState::new()
//!     .with_baseline(baseline)
//!     .with_comparison(rival)
//!     .analyze(&config);
//!
//! if let Some(ghost) = report.comparison.as_ref().and_then(|c| c.ghost.as_ref()) {
//!     println!("{}", ghost.to_json().unwrap());
//! }
//! for warning in &report.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

// Public modules
pub mod align;
pub mod config;
pub mod cursor;
pub mod events;
pub mod formats;
pub mod ghost;
pub mod session;
pub mod table;
pub mod types;
pub mod view;

// Re-export main types for convenience
pub use align::{align, pair_by_key, pair_by_position, AlignedTable, RowPairing};
pub use config::{AnalysisConfig, DuplicatePolicy, KeyMatch, Pairing};
pub use cursor::{clamp_frame, default_frame, FrameSnapshot, PlaybackCursor};
pub use events::{detect_events, EventDetector, EventMarkers, EventZone};
pub use formats::read_table;
pub use ghost::{export_ghost, GhostFrame, GhostReplay, GhostSample};
pub use session::{ComparisonSummary, Lap, LapSummary, SessionReport, SessionState};
pub use table::{normalize, RawTable, Table};
pub use types::{columns, Result, TelemetryError, Warning};
pub use view::{ChartData, GpsTrack, Series};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
