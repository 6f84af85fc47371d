//! Ghost replay export
//!
//! A ghost replay pairs the position and speed of two laps frame by frame so
//! a player can run both cars side by side. Frames are built from a
//! [`RowPairing`]: by row position (the default) or by the key alignment.
//!
//! Serialized form, one object per frame:
//!
//! ```json
//! [{"frame": 0, "<labelA>": {"lat": 1.0, "lon": 2.0, "speed": 3.0}, "<labelB>": {...}}]
//! ```

use crate::align::{pair_by_key, pair_by_position, RowPairing};
use crate::config::{AnalysisConfig, Pairing};
use crate::table::Table;
use crate::types::{columns, Result, TelemetryError};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Reserved key in every serialized frame
const FRAME_FIELD: &str = "frame";

/// Position and speed of one lap at one frame; absent data is `null`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GhostSample {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub speed: Option<f64>,
}

impl GhostSample {
    fn read(table: &Table, row: usize) -> Self {
        Self {
            lat: table.value(row, columns::LAT),
            lon: table.value(row, columns::LON),
            speed: table.value(row, columns::SPEED),
        }
    }
}

/// One synchronized playback frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhostFrame {
    pub frame: usize,
    pub a: GhostSample,
    pub b: GhostSample,
}

/// The full frame sequence plus the lap labels used as JSON keys
#[derive(Debug, Clone, PartialEq)]
pub struct GhostReplay {
    label_a: String,
    label_b: String,
    frames: Vec<GhostFrame>,
}

impl GhostReplay {
    /// Labels of lap A and lap B
    pub fn labels(&self) -> (&str, &str) {
        (&self.label_a, &self.label_b)
    }

    /// Frames in ascending order
    pub fn frames(&self) -> &[GhostFrame] {
        &self.frames
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the replay has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sample of the lap labelled `label` at `frame`
    pub fn sample(&self, frame: usize, label: &str) -> Option<&GhostSample> {
        let frame = self.frames.get(frame)?;
        if label == self.label_a {
            Some(&frame.a)
        } else if label == self.label_b {
            Some(&frame.b)
        } else {
            None
        }
    }

    /// Serialize to the pretty-printed JSON download payload
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for GhostReplay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.frames.len()))?;
        for frame in &self.frames {
            seq.serialize_element(&LabelledFrame {
                frame,
                label_a: &self.label_a,
                label_b: &self.label_b,
            })?;
        }
        seq.end()
    }
}

/// A frame borrowed together with the labels it is keyed by
struct LabelledFrame<'a> {
    frame: &'a GhostFrame,
    label_a: &'a str,
    label_b: &'a str,
}

impl Serialize for LabelledFrame<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(FRAME_FIELD, &self.frame.frame)?;
        map.serialize_entry(self.label_a, &self.frame.a)?;
        map.serialize_entry(self.label_b, &self.frame.b)?;
        map.end()
    }
}

fn check_labels(label_a: &str, label_b: &str) -> Result<()> {
    if label_a == label_b {
        return Err(TelemetryError::LabelConflict(format!(
            "both laps are labelled '{}'",
            label_a
        )));
    }
    if let Some(label) = [label_a, label_b].into_iter().find(|l| *l == FRAME_FIELD) {
        return Err(TelemetryError::LabelConflict(format!(
            "'{}' is reserved in ghost frames",
            label
        )));
    }
    Ok(())
}

/// Build a replay from an explicit row pairing
///
/// Frame `i` reads the `i`-th pair. Pairs that point past either table read
/// as empty samples.
pub fn export_with_pairing(
    a: &Table,
    label_a: &str,
    b: &Table,
    label_b: &str,
    pairing: &RowPairing,
) -> Result<GhostReplay> {
    check_labels(label_a, label_b)?;

    let frames = pairing
        .pairs()
        .iter()
        .enumerate()
        .map(|(frame, &(row_a, row_b))| GhostFrame {
            frame,
            a: GhostSample::read(a, row_a),
            b: GhostSample::read(b, row_b),
        })
        .collect();

    Ok(GhostReplay {
        label_a: label_a.to_string(),
        label_b: label_b.to_string(),
        frames,
    })
}

/// Export a ghost replay of two laps
///
/// With `Pairing::Position` the replay has `min(len(a), len(b))` frames and
/// frame `i` pairs row `i` of each lap. With `Pairing::Key` it follows the
/// key alignment, which can fail like [`crate::align::align`] does.
pub fn export_ghost(
    a: &Table,
    label_a: &str,
    b: &Table,
    label_b: &str,
    config: &AnalysisConfig,
) -> Result<GhostReplay> {
    let pairing = match config.pairing {
        Pairing::Position => pair_by_position(a.len(), b.len()),
        Pairing::Key => pair_by_key(a, label_a, b, label_b, config)?,
    };
    let replay = export_with_pairing(a, label_a, b, label_b, &pairing)?;

    log::info!(
        "Ghost replay {} vs {}: {} frames ({:?} pairing)",
        label_a,
        label_b,
        replay.len(),
        config.pairing
    );
    Ok(replay)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(keys: &[f64], speeds: &[f64], with_gps: bool) -> Table {
        let mut columns = vec![
            ("LapDistPct", keys.iter().map(|&k| Some(k)).collect::<Vec<_>>()),
            ("Speed", speeds.iter().map(|&s| Some(s)).collect()),
        ];
        if with_gps {
            columns.push(("Lat", keys.iter().map(|&k| Some(45.0 + k / 1000.0)).collect()));
            columns.push(("Lon", keys.iter().map(|&k| Some(7.0 + k / 1000.0)).collect()));
        }
        Table::from_columns(columns).unwrap()
    }

    #[test]
    fn test_position_pairing_length_and_values() {
        let a = lap(&[0.0, 10.0, 20.0, 30.0], &[100.0, 110.0, 120.0, 130.0], true);
        let b = lap(&[0.0, 15.0, 30.0], &[90.0, 95.0, 99.0], false);

        let replay = export_ghost(&a, "x", &b, "y", &AnalysisConfig::default()).unwrap();

        assert_eq!(replay.len(), 3);
        for i in 0..replay.len() {
            assert_eq!(replay.sample(i, "x").unwrap().speed, a.value(i, "Speed"));
            assert_eq!(replay.frames()[i].frame, i);
        }
        assert_eq!(replay.sample(1, "y").unwrap().lat, None);
        assert_eq!(replay.sample(1, "x").unwrap().lat, a.value(1, "Lat"));
        assert!(replay.sample(0, "z").is_none());
    }

    #[test]
    fn test_key_pairing_follows_alignment() {
        let a = lap(&[0.0, 10.0, 20.0, 30.0], &[100.0, 110.0, 120.0, 130.0], false);
        let b = lap(&[0.0, 15.0, 30.0], &[90.0, 95.0, 99.0], false);

        let config = AnalysisConfig::new().with_pairing(Pairing::Key);
        let replay = export_ghost(&a, "x", &b, "y", &config).unwrap();

        assert_eq!(replay.len(), 2);
        assert_eq!(replay.frames()[1].frame, 1);
        assert_eq!(replay.frames()[1].a.speed, Some(130.0));
        assert_eq!(replay.frames()[1].b.speed, Some(99.0));
    }

    #[test]
    fn test_json_shape() {
        let a = lap(&[0.0], &[100.0], true);
        let b = lap(&[0.0], &[90.0], false);

        let replay = export_ghost(&a, "baseline", &b, "rival", &AnalysisConfig::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&replay.to_json().unwrap()).unwrap();

        assert_eq!(json[0]["frame"], 0);
        assert_eq!(json[0]["baseline"]["speed"], 100.0);
        assert_eq!(json[0]["baseline"]["lat"], 45.0);
        assert!(json[0]["rival"]["lat"].is_null());
        assert!(json[0]["rival"]["lon"].is_null());
        assert_eq!(json[0]["rival"]["speed"], 90.0);
    }

    #[test]
    fn test_empty_lap_gives_empty_replay() {
        let a = lap(&[], &[], false);
        let b = lap(&[0.0], &[1.0], false);
        let replay = export_ghost(&a, "x", &b, "y", &AnalysisConfig::default()).unwrap();
        assert!(replay.is_empty());
        assert_eq!(replay.to_json().unwrap(), "[]");
    }

    #[test]
    fn test_reserved_and_equal_labels() {
        let a = lap(&[0.0], &[1.0], false);
        let config = AnalysisConfig::default();
        assert!(matches!(
            export_ghost(&a, "frame", &a, "y", &config),
            Err(TelemetryError::LabelConflict(_))
        ));
        assert!(matches!(
            export_ghost(&a, "same", &a, "same", &config),
            Err(TelemetryError::LabelConflict(_))
        ));
    }
}
