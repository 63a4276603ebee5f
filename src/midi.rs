//! Standard MIDI File decoding.
//!
//! Byte-level parsing is done by `midly`; this module walks the parsed
//! tracks, pairs note-on/note-off messages into [`NoteEvent`]s and collects
//! tempo changes for the [`TempoMap`].

use std::collections::HashMap;

use midly::{Fps, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEventKind};

use crate::error::Result;
use crate::model::NoteEvent;
use crate::timemap::{TempoChange, TempoMap};

/// Which tracks contribute notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackSelection {
    /// Only the first track (the scanner expects a single monophonic voice)
    #[default]
    First,
    /// Notes from every track, merged by start time
    All,
}

#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub tracks: TrackSelection,
}

/// Everything the renderer needs from a MIDI file.
#[derive(Debug, Clone)]
pub struct DecodedMidi {
    pub ticks_per_quarter: u32,
    /// Notes sorted by start tick; ties keep track/file order
    pub notes: Vec<NoteEvent>,
    pub tempo_map: TempoMap,
    pub track_count: usize,
}

/// Parse SMF bytes and extract notes.
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<DecodedMidi> {
    let smf = Smf::parse(data)?;
    let ticks_per_quarter = ticks_per_quarter(smf.header.timing);

    // Tempo events may live in any track (format 1 keeps them in track 0)
    let mut tempo_changes = Vec::new();
    for track in &smf.tracks {
        collect_tempo_changes(track, &mut tempo_changes);
    }
    let tempo_map = TempoMap::new(ticks_per_quarter, tempo_changes);

    let selected: Vec<(usize, &Track<'_>)> = match options.tracks {
        TrackSelection::First => smf.tracks.iter().enumerate().take(1).collect(),
        TrackSelection::All => smf.tracks.iter().enumerate().collect(),
    };

    let mut notes = Vec::new();
    for (track_idx, track) in selected {
        let before = notes.len();
        extract_track_notes(track, track_idx, &tempo_map, &mut notes);
        log::debug!(
            "Track {}: {} events, {} notes",
            track_idx,
            track.len(),
            notes.len() - before
        );
    }

    notes.sort_by_key(|n| n.start_tick);

    Ok(DecodedMidi {
        ticks_per_quarter,
        notes,
        tempo_map,
        track_count: smf.tracks.len(),
    })
}

/// Ticks per quarter note for the file's division.
///
/// SMPTE timecode divisions count ticks per second rather than per beat;
/// those are converted assuming 120 BPM.
fn ticks_per_quarter(timing: Timing) -> u32 {
    match timing {
        Timing::Metrical(tpq) => tpq.as_int() as u32,
        Timing::Timecode(fps, subframes) => {
            let frames_per_sec = match fps {
                Fps::Fps24 => 24.0,
                Fps::Fps25 => 25.0,
                Fps::Fps29 => 29.97,
                Fps::Fps30 => 30.0,
            };
            ((frames_per_sec * subframes as f64) / 2.0).round().max(1.0) as u32
        }
    }
}

fn collect_tempo_changes(track: &Track<'_>, out: &mut Vec<TempoChange>) {
    let mut tick: u64 = 0;
    for event in track {
        tick += event.delta.as_int() as u64;
        if let TrackEventKind::Meta(MetaMessage::Tempo(us)) = event.kind {
            out.push(TempoChange {
                tick,
                us_per_quarter: us.as_int(),
            });
        }
    }
}

/// Pair note-on/note-off messages of one track.
fn extract_track_notes(
    track: &Track<'_>,
    track_idx: usize,
    tempo_map: &TempoMap,
    out: &mut Vec<NoteEvent>,
) {
    // (channel, key) -> (velocity, start tick)
    let mut active: HashMap<(u8, u8), (u8, u64)> = HashMap::new();
    let mut tick: u64 = 0;

    let make_note = |channel: u8, pitch: u8, velocity: u8, start: u64, end: u64| NoteEvent {
        pitch,
        velocity,
        start_tick: start,
        end_tick: end,
        start_time: tempo_map.ticks_to_quarters(start),
        end_time: tempo_map.ticks_to_quarters(end),
        channel,
        track: track_idx,
    };

    for event in track {
        tick += event.delta.as_int() as u64;

        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        let channel = channel.as_int();

        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                let key = key.as_int();
                if active.insert((channel, key), (vel.as_int(), tick)).is_some() {
                    log::warn!(
                        "Overlapping note {} at tick {} on channel {}; restarting it",
                        key,
                        tick,
                        channel
                    );
                }
            }
            // Note-on with velocity 0 is a note-off
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                if let Some((velocity, start)) = active.remove(&(channel, key)) {
                    out.push(make_note(channel, key, velocity, start, tick));
                }
            }
            _ => {}
        }
    }

    // Close dangling notes at the end of the track, in start order so the
    // output does not depend on hash order.
    let mut dangling: Vec<_> = active.into_iter().collect();
    dangling.sort_by_key(|&((channel, key), (_, start))| (start, channel, key));
    for ((channel, key), (velocity, start)) in dangling {
        log::warn!("Note {} started at tick {} was never released; closing at tick {}", key, start, tick);
        out.push(make_note(channel, key, velocity, start, tick));
    }
}
