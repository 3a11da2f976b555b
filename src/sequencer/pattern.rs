// Pattern - Notes placed in a bounded or looping span of beats
// A pattern is like a "clip" in other DAWs, anchored at an absolute start beat

use super::note::Note;
use super::{TransportError, TransportResult};

/// Span of absolute beats a pattern covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternWindow {
    start: f64,
    length_beats: u32,
    looping: bool,
}

impl PatternWindow {
    /// Creates a new window
    ///
    /// A looping window of length zero plays as a non-looping one.
    pub fn new(start: f64, length_beats: u32, looping: bool) -> TransportResult<Self> {
        if !start.is_finite() || start < 0.0 {
            return Err(TransportError::InvalidPattern(format!(
                "start must be finite and >= 0, got {start}"
            )));
        }
        if looping && length_beats == 0 {
            tracing::warn!(start, "zero-length looping pattern, playing as non-looping");
        }

        Ok(Self {
            start,
            length_beats,
            looping,
        })
    }

    /// Absolute start position in beats
    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn length_beats(&self) -> u32 {
        self.length_beats
    }

    /// Whether the window actually repeats (looping with a non-zero length)
    pub fn is_looping(&self) -> bool {
        self.looping && self.length_beats > 0
    }

    /// Map an absolute beat into the pattern.
    ///
    /// Returns `(cycle_offset, local_position)` where `cycle_offset` is the
    /// absolute position of the current pattern cycle, or `None` when the beat
    /// falls outside the window.
    pub fn locate(&self, beat: f64) -> Option<(f64, f64)> {
        if beat < self.start {
            return None;
        }

        let length = self.length_beats as f64;
        if self.is_looping() {
            let cycle = ((beat - self.start) / length).floor();
            let offset = self.start + length * cycle;
            Some((offset, beat - offset))
        } else if beat >= self.start + length {
            None
        } else {
            Some((self.start, beat - self.start))
        }
    }
}

impl Default for PatternWindow {
    fn default() -> Self {
        Self {
            start: 0.0,
            length_beats: 4,
            looping: true,
        }
    }
}

/// Notes of one sequencer plus the window they play in
///
/// Notes are kept sorted by position so the one-beat lookup done on every
/// beat is a binary search.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    window: PatternWindow,
    notes: Vec<Note>,
}

impl Pattern {
    /// Create a new empty pattern
    pub fn new(window: PatternWindow) -> Self {
        Self {
            window,
            notes: Vec::new(),
        }
    }

    /// Create a pattern from a list of notes in any order
    pub fn with_notes(window: PatternWindow, notes: impl IntoIterator<Item = Note>) -> Self {
        let mut pattern = Self::new(window);
        for note in notes {
            pattern.add_note(note);
        }
        pattern
    }

    pub fn window(&self) -> &PatternWindow {
        &self.window
    }

    pub fn set_window(&mut self, window: PatternWindow) {
        self.window = window;
    }

    /// Get all notes, sorted by position
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Add a note to the pattern
    pub fn add_note(&mut self, note: Note) {
        // Notes sharing a position keep their insertion order
        let insert_pos = self
            .notes
            .partition_point(|n| n.position() <= note.position());
        self.notes.insert(insert_pos, note);
    }

    /// Notes starting in `[local, local + 1)`, restricted to the pattern length
    pub fn notes_in_beat(&self, local: f64) -> impl Iterator<Item = &Note> {
        let end = (local + 1.0).min(self.window.length_beats as f64);
        let first = self.notes.partition_point(|n| n.position() < local);
        self.notes[first..]
            .iter()
            .take_while(move |n| n.position() < end)
    }

    /// Clear all notes
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
