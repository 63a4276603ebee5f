//! Score renderer: converts decoded notes into a [`Canvas`] of segments.
//!
//! Each note becomes one horizontal stroke. Its row comes from a linear
//! pitch mapping onto the sensor band (low pitches near the bottom) and its
//! extent from the configured time scale. The writers in [`svg_builder`]
//! and [`pdf_builder`] turn the canvas into a document.

pub mod pdf_builder;
pub mod svg_builder;

use crate::config::{Layout, OutOfRange, TimeScale};
use crate::error::{Error, Result};
use crate::model::{Canvas, NoteEvent, PageGeometry, Segment};
use crate::timemap::TempoMap;

pub use pdf_builder::render_pdf;
pub use svg_builder::render_svg;

// ═══════════════════════════════════════════════════════════════════════
// ScoreRenderer
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ScoreRenderer {
    layout: Layout,
}

impl ScoreRenderer {
    pub fn new(layout: Layout) -> Result<Self> {
        layout.validate()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Sensor row for a pitch: `sensor_points` at the lowest pitch, one
    /// semitone step (36 points by default) less for each semitone above.
    pub fn pitch_to_y(&self, pitch: u8) -> f64 {
        let steps = pitch as f64 - self.layout.lowest_pitch as f64;
        self.layout.sensor_points as f64 - steps * self.layout.points_per_semitone()
    }

    /// Horizontal page position (mm) of a time expressed in the unit of the
    /// layout's time scale (quarter notes or seconds).
    pub fn time_to_x(&self, time: f64) -> f64 {
        self.layout.start_offset_mm + time * self.layout.time_scale.mm()
    }

    fn note_times(&self, note: &NoteEvent, tempo_map: &TempoMap) -> (f64, f64) {
        match self.layout.time_scale {
            TimeScale::PerQuarter { .. } => (note.start_time, note.end_time),
            TimeScale::PerSecond { .. } => (
                tempo_map.ticks_to_seconds(note.start_tick),
                tempo_map.ticks_to_seconds(note.end_tick),
            ),
        }
    }

    /// Apply the out-of-range policy. `Ok(None)` means the note is skipped.
    fn resolve_pitch(&self, note: &NoteEvent) -> Result<Option<u8>> {
        let (low, high) = (self.layout.lowest_pitch, self.layout.highest_pitch);
        if (low..=high).contains(&note.pitch) {
            return Ok(Some(note.pitch));
        }
        match self.layout.out_of_range {
            OutOfRange::Drop => {
                log::warn!("Dropping note {} (outside {}-{})", note.pitch, low, high);
                Ok(None)
            }
            OutOfRange::Clamp => {
                let clamped = note.pitch.clamp(low, high);
                log::debug!("Clamping note {} to {}", note.pitch, clamped);
                Ok(Some(clamped))
            }
            OutOfRange::Reject => Err(Error::PitchOutOfRange {
                pitch: note.pitch,
                tick: note.start_tick,
            }),
        }
    }

    /// Map every note to a segment, in input order.
    pub fn render(&self, notes: &[NoteEvent], tempo_map: &TempoMap) -> Result<Canvas> {
        let mut segments = Vec::with_capacity(notes.len());

        for note in notes {
            let Some(pitch) = self.resolve_pitch(note)? else {
                continue;
            };
            let (start, end) = self.note_times(note, tempo_map);
            segments.push(Segment {
                pitch,
                velocity: note.velocity,
                y: self.pitch_to_y(pitch),
                x_start: self.time_to_x(start),
                x_end: self.time_to_x(end),
            });
        }

        if notes.is_empty() {
            log::warn!("No notes to render; producing an empty page");
        } else if segments.is_empty() {
            log::warn!("All notes were outside the pitch window; producing an empty page");
        }

        let last_x = segments
            .iter()
            .map(|s| s.x_end)
            .fold(self.layout.start_offset_mm, f64::max);

        Ok(Canvas {
            page: self.page_geometry(last_x + self.layout.right_margin_mm),
            segments,
        })
    }

    fn page_geometry(&self, width_mm: f64) -> PageGeometry {
        PageGeometry {
            width_mm,
            height_mm: self.layout.page_height_mm,
            bottom_offset_mm: self.layout.bottom_offset_mm,
            mm_per_point: self.layout.mm_per_point(),
            sensor_points: self.layout.sensor_points,
            note_height_mm: self.layout.note_height_mm,
            calibration_mark_mm: self.layout.calibration_mark_mm,
        }
    }
}

/// Render notes with a one-off renderer.
pub fn render_notes(notes: &[NoteEvent], tempo_map: &TempoMap, layout: &Layout) -> Result<Canvas> {
    ScoreRenderer::new(layout.clone())?.render(notes, tempo_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MIDI_B8, MIDI_C1};
    use crate::timemap::TempoChange;
    use pretty_assertions::assert_eq;

    const TPQ: u32 = 480;

    fn note(pitch: u8, start_tick: u64, end_tick: u64) -> NoteEvent {
        NoteEvent {
            pitch,
            velocity: 100,
            start_tick,
            end_tick,
            start_time: start_tick as f64 / TPQ as f64,
            end_time: end_tick as f64 / TPQ as f64,
            channel: 0,
            track: 0,
        }
    }

    fn renderer() -> ScoreRenderer {
        ScoreRenderer::new(Layout::default()).unwrap()
    }

    fn tempo() -> TempoMap {
        TempoMap::new(TPQ, Vec::new())
    }

    #[test]
    fn y_stays_inside_sensor_band() {
        let r = renderer();
        for pitch in MIDI_C1..=MIDI_B8 {
            let y = r.pitch_to_y(pitch);
            assert!((0.0..=3456.0).contains(&y), "pitch {pitch} -> y {y}");
        }
        assert_eq!(r.pitch_to_y(MIDI_C1), 3456.0);
        assert_eq!(r.pitch_to_y(MIDI_B8), 36.0);
    }

    #[test]
    fn higher_pitch_is_higher_on_page() {
        let r = renderer();
        for pitch in MIDI_C1..MIDI_B8 {
            assert!(r.pitch_to_y(pitch + 1) < r.pitch_to_y(pitch));
        }
    }

    #[test]
    fn middle_c_quarter_note() {
        let canvas = renderer().render(&[note(60, 0, 480)], &tempo()).unwrap();
        assert_eq!(
            canvas.segments,
            vec![Segment {
                pitch: 60,
                velocity: 100,
                y: 2160.0,
                x_start: 23.0,
                x_end: 30.0,
            }]
        );
        assert_eq!(canvas.page.width_mm, 40.0);
        assert_eq!(canvas.page.height_mm, 297.0);
    }

    #[test]
    fn length_is_proportional_to_duration() {
        let notes = [note(60, 0, 120), note(62, 480, 1440), note(64, 1440, 3360)];
        let canvas = renderer().render(&notes, &tempo()).unwrap();
        for (n, s) in notes.iter().zip(&canvas.segments) {
            let quarters = (n.end_tick - n.start_tick) as f64 / TPQ as f64;
            assert!((s.length() - quarters * 7.0).abs() < 1e-9);
        }
    }

    #[test]
    fn segments_keep_arrival_order() {
        let notes = [note(70, 960, 1440), note(50, 0, 480)];
        let canvas = renderer().render(&notes, &tempo()).unwrap();
        let pitches: Vec<u8> = canvas.segments.iter().map(|s| s.pitch).collect();
        assert_eq!(pitches, vec![70, 50]);
        assert_eq!(canvas.page.width_mm, 23.0 + 3.0 * 7.0 + 10.0);
    }

    #[test]
    fn empty_input_gives_empty_canvas() {
        let canvas = renderer().render(&[], &tempo()).unwrap();
        assert!(canvas.is_empty());
        assert_eq!(canvas.page.width_mm, 33.0);
    }

    #[test]
    fn out_of_range_dropped_by_default() {
        let canvas = renderer()
            .render(&[note(12, 0, 480), note(60, 0, 480), note(127, 0, 480)], &tempo())
            .unwrap();
        assert_eq!(canvas.segments.len(), 1);
        assert_eq!(canvas.segments[0].pitch, 60);
    }

    #[test]
    fn out_of_range_clamped() {
        let layout = Layout { out_of_range: OutOfRange::Clamp, ..Layout::default() };
        let canvas = ScoreRenderer::new(layout)
            .unwrap()
            .render(&[note(12, 0, 480), note(127, 0, 480)], &tempo())
            .unwrap();
        let ys: Vec<f64> = canvas.segments.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![3456.0, 36.0]);
    }

    #[test]
    fn out_of_range_rejected() {
        let layout = Layout { out_of_range: OutOfRange::Reject, ..Layout::default() };
        let err = ScoreRenderer::new(layout)
            .unwrap()
            .render(&[note(60, 0, 480), note(120, 480, 960)], &tempo())
            .unwrap_err();
        assert!(matches!(err, Error::PitchOutOfRange { pitch: 120, tick: 480 }));
    }

    #[test]
    fn per_second_scale_follows_tempo() {
        let layout = Layout { time_scale: TimeScale::PerSecond { mm: 10.0 }, ..Layout::default() };
        // 60 BPM: one quarter lasts one second
        let map = TempoMap::new(TPQ, vec![TempoChange { tick: 0, us_per_quarter: 1_000_000 }]);
        let canvas = ScoreRenderer::new(layout)
            .unwrap()
            .render(&[note(60, 480, 960)], &map)
            .unwrap();
        let s = &canvas.segments[0];
        assert_eq!((s.x_start, s.x_end), (33.0, 43.0));
    }

    #[test]
    fn invalid_layout_is_refused() {
        let layout = Layout { pitch_band_mm: -1.0, ..Layout::default() };
        assert!(ScoreRenderer::new(layout).is_err());
    }
}
