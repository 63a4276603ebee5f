//! Tick → musical time and tick → wall-clock time conversion.
//!
//! MIDI stores time as ticks; how long a tick lasts depends on the file's
//! division and on every tempo meta event before it. The map is built once
//! from all tracks and then queried per note boundary.

/// Default tempo when a file carries no tempo event (120 BPM).
pub const DEFAULT_US_PER_QUARTER: u32 = 500_000;

/// A tempo change at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub tick: u64,
    pub us_per_quarter: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    ticks_per_quarter: u32,
    /// Sorted by tick, first entry always at tick 0
    changes: Vec<TempoChange>,
}

impl TempoMap {
    /// Build a map from tempo changes in any order. Later entries at the
    /// same tick win, matching playback order.
    pub fn new(ticks_per_quarter: u32, mut changes: Vec<TempoChange>) -> Self {
        changes.sort_by_key(|c| c.tick);

        let mut deduped: Vec<TempoChange> = Vec::with_capacity(changes.len() + 1);
        for change in changes {
            match deduped.last_mut() {
                Some(last) if last.tick == change.tick => *last = change,
                _ => deduped.push(change),
            }
        }
        if deduped.first().map_or(true, |c| c.tick > 0) {
            deduped.insert(
                0,
                TempoChange {
                    tick: 0,
                    us_per_quarter: DEFAULT_US_PER_QUARTER,
                },
            );
        }

        Self {
            ticks_per_quarter: ticks_per_quarter.max(1),
            changes: deduped,
        }
    }

    /// A map with a single constant tempo.
    pub fn constant(ticks_per_quarter: u32, us_per_quarter: u32) -> Self {
        Self::new(ticks_per_quarter, vec![TempoChange { tick: 0, us_per_quarter }])
    }

    pub fn ticks_per_quarter(&self) -> u32 {
        self.ticks_per_quarter
    }

    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    pub fn ticks_to_quarters(&self, tick: u64) -> f64 {
        tick as f64 / self.ticks_per_quarter as f64
    }

    /// Wall-clock position of `tick`, accumulating every tempo segment
    /// that precedes it.
    pub fn ticks_to_seconds(&self, tick: u64) -> f64 {
        let tpq = self.ticks_per_quarter as f64;
        let mut seconds = 0.0;

        for (i, change) in self.changes.iter().enumerate() {
            if tick <= change.tick {
                break;
            }
            let segment_end = self
                .changes
                .get(i + 1)
                .map_or(tick, |next| next.tick.min(tick));
            let ticks = (segment_end - change.tick) as f64;
            seconds += ticks / tpq * change.us_per_quarter as f64 / 1_000_000.0;
        }

        seconds
    }

    /// Tempo in effect at `tick`, in beats per minute.
    pub fn bpm_at(&self, tick: u64) -> f64 {
        let us = self
            .changes
            .iter()
            .take_while(|c| c.tick <= tick)
            .last()
            .map_or(DEFAULT_US_PER_QUARTER, |c| c.us_per_quarter);
        60_000_000.0 / us as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_tempo_is_120_bpm() {
        let map = TempoMap::new(480, Vec::new());
        assert!(approx(map.bpm_at(0), 120.0));
        assert!(approx(map.ticks_to_seconds(480), 0.5));
        assert!(approx(map.ticks_to_quarters(960), 2.0));
    }

    #[test]
    fn tempo_change_splits_segments() {
        // 120 BPM for one quarter, then 60 BPM
        let map = TempoMap::new(
            480,
            vec![
                TempoChange { tick: 480, us_per_quarter: 1_000_000 },
                TempoChange { tick: 0, us_per_quarter: 500_000 },
            ],
        );
        assert!(approx(map.ticks_to_seconds(480), 0.5));
        assert!(approx(map.ticks_to_seconds(960), 1.5));
        assert!(approx(map.ticks_to_seconds(720), 1.0));
        assert!(approx(map.bpm_at(500), 60.0));
    }

    #[test]
    fn later_event_at_same_tick_wins() {
        let map = TempoMap::new(
            96,
            vec![
                TempoChange { tick: 0, us_per_quarter: 400_000 },
                TempoChange { tick: 0, us_per_quarter: 250_000 },
            ],
        );
        assert_eq!(map.changes().len(), 1);
        assert!(approx(map.bpm_at(0), 240.0));
    }

    #[test]
    fn zero_division_does_not_divide_by_zero() {
        let map = TempoMap::constant(0, DEFAULT_US_PER_QUARTER);
        assert_eq!(map.ticks_per_quarter(), 1);
        assert!(approx(map.ticks_to_quarters(3), 3.0));
    }
}
