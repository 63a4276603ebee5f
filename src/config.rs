//! Physical layout of the printed score.
//!
//! Every value has a default matching the Sp3ctra scanner (A4 portrait page,
//! 3456-point sensor band covering C1-B8). A layout can be loaded from JSON;
//! missing keys keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const SEMITONES_PER_OCTAVE: u32 = 12;

/// MIDI note number of C1.
pub const MIDI_C1: u8 = 24;
/// MIDI note number of B8.
pub const MIDI_B8: u8 = 119;

/// How note times are turned into horizontal millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum TimeScale {
    /// Fixed length per quarter note, independent of tempo
    PerQuarter { mm: f64 },
    /// Fixed length per second of playback (follows tempo changes)
    PerSecond { mm: f64 },
}

impl TimeScale {
    pub fn mm(&self) -> f64 {
        match *self {
            TimeScale::PerQuarter { mm } | TimeScale::PerSecond { mm } => mm,
        }
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        TimeScale::PerQuarter { mm: 7.0 }
    }
}

/// What to do with notes outside `lowest_pitch..=highest_pitch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// Skip the note and log a warning
    #[default]
    Drop,
    /// Draw the note at the nearest edge of the pitch window
    Clamp,
    /// Fail the whole render
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub time_scale: TimeScale,
    pub note_height_mm: f64,
    pub pitch_band_mm: f64,
    pub sensor_points: u32,
    pub bottom_offset_mm: f64,
    pub start_offset_mm: f64,
    pub right_margin_mm: f64,
    pub calibration_mark_mm: f64,
    pub page_height_mm: f64,
    pub lowest_pitch: u8,
    pub highest_pitch: u8,
    pub out_of_range: OutOfRange,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            time_scale: TimeScale::default(),
            note_height_mm: 0.25,
            pitch_band_mm: 216.7,
            sensor_points: 3456,
            bottom_offset_mm: 49.5,
            start_offset_mm: 23.0,
            right_margin_mm: 10.0,
            calibration_mark_mm: 1.0,
            page_height_mm: 297.0,
            lowest_pitch: MIDI_C1,
            highest_pitch: MIDI_B8,
            out_of_range: OutOfRange::Drop,
        }
    }
}

impl Layout {
    /// Load a layout from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let layout: Layout = serde_json::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Number of semitones covered by the pitch window (96 for C1-B8).
    pub fn semitone_range(&self) -> u32 {
        (self.highest_pitch as u32 + 1).saturating_sub(self.lowest_pitch as u32)
    }

    /// Sensor points per semitone (36 with the defaults).
    pub fn points_per_semitone(&self) -> f64 {
        self.sensor_points as f64 / self.semitone_range() as f64
    }

    pub fn mm_per_point(&self) -> f64 {
        self.pitch_band_mm / self.sensor_points as f64
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("note_height_mm", self.note_height_mm),
            ("pitch_band_mm", self.pitch_band_mm),
            ("page_height_mm", self.page_height_mm),
            ("time_scale.mm", self.time_scale.mm()),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidLayout(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("bottom_offset_mm", self.bottom_offset_mm),
            ("start_offset_mm", self.start_offset_mm),
            ("right_margin_mm", self.right_margin_mm),
            ("calibration_mark_mm", self.calibration_mark_mm),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidLayout(format!("{name} must not be negative, got {value}")));
            }
        }

        if self.lowest_pitch > self.highest_pitch || self.highest_pitch > 127 {
            return Err(Error::InvalidLayout(format!(
                "pitch window {}..={} is empty or exceeds MIDI range",
                self.lowest_pitch, self.highest_pitch
            )));
        }

        // Each semitone must own a whole number of sensor points
        if self.sensor_points == 0 || self.sensor_points % self.semitone_range() != 0 {
            return Err(Error::InvalidLayout(format!(
                "sensor_points ({}) is not a multiple of the {} semitones in range",
                self.sensor_points,
                self.semitone_range()
            )));
        }

        if self.bottom_offset_mm + self.pitch_band_mm > self.page_height_mm {
            return Err(Error::InvalidLayout(format!(
                "pitch band ({} mm above a {} mm offset) does not fit on a {} mm page",
                self.pitch_band_mm, self.bottom_offset_mm, self.page_height_mm
            )));
        }

        Ok(())
    }
}
