// Sequencer Player - Reads a pattern on every beat and schedules its notes
// Notes are placed at absolute host timestamps so they sound ahead of the control tick

use super::listener::{BeatListener, ClockContext};
use super::note::Note;
use super::pattern::{Pattern, PatternWindow};
use super::timeline::{BeatIndex, Pitch};
use crate::instrument::Instrument;

/// Pattern sequencer driving one instrument
///
/// On each beat it looks up the notes quantized to that beat within the
/// current pattern cycle and schedules note-on/note-off pairs at the matching
/// host timestamps.
pub struct Sequencer<I: Instrument> {
    instrument: I,
    pattern: Pattern,
    root_pitch: Pitch,
}

impl<I: Instrument> Sequencer<I> {
    /// Root pitch used when nothing else is configured (C4)
    pub const DEFAULT_ROOT_PITCH: Pitch = 60;

    /// Create a sequencer with an empty pattern
    pub fn new(instrument: I, window: PatternWindow) -> Self {
        Self {
            instrument,
            pattern: Pattern::new(window),
            root_pitch: Self::DEFAULT_ROOT_PITCH,
        }
    }

    /// Create a sequencer around an existing pattern
    pub fn with_pattern(instrument: I, pattern: Pattern) -> Self {
        Self {
            instrument,
            pattern,
            root_pitch: Self::DEFAULT_ROOT_PITCH,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn set_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
    }

    pub fn set_window(&mut self, window: PatternWindow) {
        self.pattern.set_window(window);
    }

    pub fn add_note(&mut self, note: Note) {
        self.pattern.add_note(note);
    }

    pub fn clear_notes(&mut self) {
        self.pattern.clear();
    }

    pub fn root_pitch(&self) -> Pitch {
        self.root_pitch
    }

    pub fn set_root_pitch(&mut self, root_pitch: Pitch) {
        self.root_pitch = root_pitch;
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut I {
        &mut self.instrument
    }

    /// Silence the instrument (transport paused or stopped)
    pub fn stop_all_notes(&mut self) {
        self.instrument.set_all_notes_off();
    }
}

impl<I: Instrument> BeatListener for Sequencer<I> {
    fn on_beat(&mut self, beat: BeatIndex, clock: &mut ClockContext<'_>) {
        let Some((cycle_offset, local)) = self.pattern.window().locate(beat as f64) else {
            return;
        };

        for note in self.pattern.notes_in_beat(local) {
            if note.is_muted() {
                continue;
            }

            let position = note.position() + cycle_offset;
            let pitch = note.pitch(self.root_pitch);
            self.instrument
                .schedule_note_on(clock.timestamp(position), pitch, note.intensity());
            self.instrument
                .schedule_note_off(clock.timestamp(position + note.duration()), pitch);
        }
    }

    fn on_stop(&mut self) {
        self.stop_all_notes();
    }
}
