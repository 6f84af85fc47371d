//! Configuration loading and parsing
//!
//! Everything here can also be given on the command line; flags override the
//! values read from the file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use simsplit_core::AnalysisConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from simsplit.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub baseline: Option<PathBuf>,
    pub comparison: Option<PathBuf>,
    /// Playback frame to show; defaults to the last shared frame
    pub frame: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub zone_metric: ZoneMetric,
    pub ghost_file: Option<PathBuf>,
    pub charts_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable report
    #[default]
    Txt,
    /// Full session report as JSON
    Json,
}

/// Which count the "braking zones detected" headline reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ZoneMetric {
    /// Every sample above the threshold
    #[default]
    Samples,
    /// Runs of samples grouped by the zone gap
    Contiguous,
}

impl AppConfig {
    /// Reject values no analysis can run with
    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if analysis.key_column.trim().is_empty() {
            bail!("analysis.key_column must not be empty");
        }
        if !analysis.brake_threshold.is_finite() || !analysis.throttle_threshold.is_finite() {
            bail!("event thresholds must be finite numbers");
        }
        if !(analysis.zone_gap >= 0.0) {
            bail!("analysis.zone_gap must be zero or positive, got {}", analysis.zone_gap);
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}
