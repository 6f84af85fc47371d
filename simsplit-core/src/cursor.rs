//! Playback cursor shared by one or two laps
//!
//! The cursor indexes rows by position. With two laps it only ranges over the
//! shorter one, so a frame is always valid in both tables.

use crate::table::{Cell, Table};
use serde::Serialize;

/// Number of frames addressable across the active laps
///
/// `len_b` is `None` when only one lap is loaded.
pub fn effective_len(len_a: usize, len_b: Option<usize>) -> usize {
    match len_b {
        Some(len_b) => len_a.min(len_b),
        None => len_a,
    }
}

/// Clamp a requested frame into `[0, L-1]`
///
/// Returns `None` when there is no frame at all (`L == 0`).
pub fn clamp_frame(requested: i64, len_a: usize, len_b: Option<usize>) -> Option<usize> {
    let len = effective_len(len_a, len_b);
    if len == 0 {
        return None;
    }
    let last = len - 1;
    Some(if requested <= 0 {
        0
    } else {
        usize::try_from(requested).map_or(last, |frame| frame.min(last))
    })
}

/// Initial frame: the end of the (shorter) lap
pub fn default_frame(len_a: usize, len_b: Option<usize>) -> Option<usize> {
    effective_len(len_a, len_b).checked_sub(1)
}

/// A frame position bounded by the active laps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    len: usize,
    frame: usize,
}

impl PlaybackCursor {
    /// Create a cursor at the default (last) frame
    ///
    /// Returns `None` if the effective length is zero.
    pub fn new(len_a: usize, len_b: Option<usize>) -> Option<Self> {
        let len = effective_len(len_a, len_b);
        default_frame(len_a, len_b).map(|frame| Self { len, frame })
    }

    /// Builder method: start at a requested frame instead of the end
    pub fn with_frame(mut self, requested: i64) -> Self {
        self.seek(requested);
        self
    }

    /// Move to a requested frame, clamped; returns the new frame
    pub fn seek(&mut self, requested: i64) -> usize {
        // len > 0 is guaranteed by the constructor
        self.frame = clamp_frame(requested, self.len, None).unwrap_or(0);
        self.frame
    }

    /// Move by a signed number of frames, clamped; returns the new frame
    pub fn step(&mut self, delta: i64) -> usize {
        let current = i64::try_from(self.frame).unwrap_or(i64::MAX);
        self.seek(current.saturating_add(delta))
    }

    /// Current frame
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Number of addressable frames
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a cursor is only built over at least one frame
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the cursor sits on the last frame
    pub fn is_at_end(&self) -> bool {
        self.frame + 1 == self.len
    }
}

/// All values of one lap at a playback frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub label: String,
    pub frame: usize,
    pub cells: Vec<Cell>,
}

/// Read a lap's row at `frame` for display
pub fn snapshot(table: &Table, label: &str, frame: usize) -> Option<FrameSnapshot> {
    table.row(frame).map(|cells| FrameSnapshot {
        label: label.to_string(),
        frame,
        cells,
    })
}
