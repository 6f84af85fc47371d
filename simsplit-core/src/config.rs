//! Analysis configuration types
//!
//! This module defines the policies the library needs to compare two laps:
//! how key values are matched, what happens to duplicate keys, how ghost
//! frames pair rows, and the event thresholds.

use crate::types::columns;
use serde::{Deserialize, Serialize};

/// Configuration for lap alignment, event detection and ghost export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Progress column used as the join key
    #[serde(default = "default_key_column")]
    pub key_column: String,

    /// How key values from the two laps are compared
    #[serde(default)]
    pub key_match: KeyMatch,

    /// What to do when a key value repeats within one lap
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// How ghost replay frames pair the rows of the two laps
    #[serde(default)]
    pub pairing: Pairing,

    /// Brake values strictly above this mark a braking sample
    #[serde(default = "default_brake_threshold")]
    pub brake_threshold: f64,

    /// Throttle values strictly above this mark an acceleration sample
    #[serde(default = "default_throttle_threshold")]
    pub throttle_threshold: f64,

    /// Largest key gap (in % of lap) still treated as the same zone
    #[serde(default = "default_zone_gap")]
    pub zone_gap: f64,
}

fn default_key_column() -> String {
    columns::LAP_DIST_PCT.to_string()
}

fn default_brake_threshold() -> f64 {
    0.1
}

fn default_throttle_threshold() -> f64 {
    0.9
}

fn default_zone_gap() -> f64 {
    1.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            key_match: KeyMatch::default(),
            duplicate_policy: DuplicatePolicy::default(),
            pairing: Pairing::default(),
            brake_threshold: default_brake_threshold(),
            throttle_threshold: default_throttle_threshold(),
            zone_gap: default_zone_gap(),
        }
    }
}

/// Key comparison policy for the join
///
/// `Rounded` is opt-in: distinct keys that round to the same value fall into
/// one duplicate group, and the joined key carries lap A's raw value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum KeyMatch {
    /// Keys must be bit-for-bit equal (`0.0` and `-0.0` are treated as equal)
    #[default]
    Exact,
    /// Keys are equal when they round to the same value at `decimals` places
    Rounded { decimals: u32 },
}

impl KeyMatch {
    /// Map a key value to a hashable join key
    ///
    /// Returns `None` for values that can never match (NaN, infinities, or a
    /// rounded value outside the `i64` range).
    pub fn join_key(&self, value: f64) -> Option<i64> {
        if !value.is_finite() {
            return None;
        }
        match *self {
            KeyMatch::Exact => {
                let value = if value == 0.0 { 0.0 } else { value };
                Some(value.to_bits() as i64)
            }
            KeyMatch::Rounded { decimals } => {
                let scaled = (value * 10f64.powi(decimals as i32)).round();
                if scaled.is_finite() && scaled.abs() < i64::MAX as f64 {
                    Some(scaled as i64)
                } else {
                    None
                }
            }
        }
    }
}

/// Handling of repeated key values within one lap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateKey`
    Reject,
    /// Keep the first row carrying each key
    #[default]
    KeepFirst,
    /// Keep the last row carrying each key
    KeepLast,
    /// Emit every matching pair within duplicate groups
    CrossProduct,
}

/// Row pairing used for ghost replay frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pairing {
    /// Frame `i` pairs row `i` of each lap
    #[default]
    Position,
    /// Frame `i` is the `i`-th row of the key alignment
    Key,
}

impl AnalysisConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the join key column
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    /// Builder method: set the key comparison policy
    pub fn with_key_match(mut self, key_match: KeyMatch) -> Self {
        self.key_match = key_match;
        self
    }

    /// Builder method: set the duplicate key policy
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Builder method: set the ghost pairing strategy
    pub fn with_pairing(mut self, pairing: Pairing) -> Self {
        self.pairing = pairing;
        self
    }

    /// Builder method: set the braking threshold
    pub fn with_brake_threshold(mut self, threshold: f64) -> Self {
        self.brake_threshold = threshold;
        self
    }

    /// Builder method: set the acceleration threshold
    pub fn with_throttle_threshold(mut self, threshold: f64) -> Self {
        self.throttle_threshold = threshold;
        self
    }

    /// Builder method: set the zone grouping gap
    pub fn with_zone_gap(mut self, gap: f64) -> Self {
        self.zone_gap = gap;
        self
    }
}
