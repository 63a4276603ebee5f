//! Data model shared by the decoder, the renderer and the vector writers.
//!
//! Horizontal positions and page sizes are in millimetres; vertical note
//! positions are in sensor points (0 at the top of the pitch band,
//! `sensor_points` at the bottom).

use serde::{Deserialize, Serialize};

/// A single note decoded from a MIDI track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// Note-on velocity (1-127)
    pub velocity: u8,
    /// Absolute tick of the note-on
    pub start_tick: u64,
    /// Absolute tick of the matching note-off
    pub end_tick: u64,
    /// Onset in quarter notes from the start of the file
    pub start_time: f64,
    /// Release in quarter notes from the start of the file
    pub end_time: f64,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Index of the track the note was read from
    pub track: usize,
}

impl NoteEvent {
    pub fn duration_ticks(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

/// One drawn stroke: a held note at a fixed height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Pitch actually drawn (after any clamping)
    pub pitch: u8,
    pub velocity: u8,
    /// Sensor-point row, top-origin
    pub y: f64,
    /// Left end in mm from the page's left edge
    pub x_start: f64,
    /// Right end in mm from the page's left edge
    pub x_end: f64,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.x_end - self.x_start
    }

    /// Ink level for this note: 0.0 is black, 1.0 is white.
    pub fn gray(&self) -> f64 {
        velocity_to_gray(self.velocity)
    }
}

/// Map a MIDI velocity to a grey level. Velocity 127 prints solid black,
/// velocity 0 would print white.
pub fn velocity_to_gray(velocity: u8) -> f64 {
    1.0 - (velocity.min(127) as f64 / 127.0)
}

/// Page geometry the vector writers need to place segments on paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    /// Distance from the page bottom to the bottom of the sensor band
    pub bottom_offset_mm: f64,
    /// Height of one sensor point on paper
    pub mm_per_point: f64,
    /// Number of sensor points in the band
    pub sensor_points: u32,
    /// Printed bar thickness
    pub note_height_mm: f64,
    /// Side of the solid calibration square at the bottom-left corner
    pub calibration_mark_mm: f64,
}

impl PageGeometry {
    /// Distance from the page bottom to the lower edge of a bar drawn at
    /// sensor row `y`.
    pub fn bar_bottom_mm(&self, y: f64) -> f64 {
        self.bottom_offset_mm + (self.sensor_points as f64 - y) * self.mm_per_point
    }

    /// Same position measured from the page top (SVG convention), to the
    /// centre line of the bar.
    pub fn bar_center_from_top_mm(&self, y: f64) -> f64 {
        self.height_mm - self.bar_bottom_mm(y) - self.note_height_mm / 2.0
    }
}

/// The rendered score: page geometry plus the ordered list of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub page: PageGeometry,
    pub segments: Vec<Segment>,
}

impl Canvas {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Output container for a rendered canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Pdf,
}

impl OutputFormat {
    /// Guess the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(OutputFormat::Svg),
            "pdf" => Some(OutputFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::from_extension(s).ok_or_else(|| crate::Error::UnsupportedFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_maps_to_gray() {
        assert_eq!(velocity_to_gray(127), 0.0);
        assert_eq!(velocity_to_gray(0), 1.0);
        assert!((velocity_to_gray(64) - (1.0 - 64.0 / 127.0)).abs() < 1e-12);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_extension("SVG"), Some(OutputFormat::Svg));
        assert_eq!(OutputFormat::from_extension("pdf"), Some(OutputFormat::Pdf));
        assert_eq!(OutputFormat::from_extension("png"), None);
        assert!("eps".parse::<OutputFormat>().is_err());
    }
}
