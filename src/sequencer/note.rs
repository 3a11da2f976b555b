// Note representation for the sequencer
// A note is a pitch offset placed at a musical position, in beats relative to its pattern

use super::timeline::Pitch;
use super::{TransportError, TransportResult};

/// A musical note in a sequencer pattern
///
/// Immutable once built. Position and duration are in beats, the pitch is an
/// offset in semitones from the owning sequencer's root pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    position: f64,
    duration: f64,
    pitch_offset: i32,
    intensity: f64,
    muted: bool,
}

impl Note {
    /// Creates a new note
    pub fn new(
        position: f64,
        duration: f64,
        pitch_offset: i32,
        intensity: f64,
    ) -> TransportResult<Self> {
        if !position.is_finite() || position < 0.0 {
            return Err(TransportError::InvalidNote(format!(
                "position must be finite and >= 0, got {position}"
            )));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(TransportError::InvalidNote(format!(
                "duration must be finite and >= 0, got {duration}"
            )));
        }
        if !(0.0..=1.0).contains(&intensity) {
            return Err(TransportError::InvalidNote(format!(
                "intensity must be between 0 and 1, got {intensity}"
            )));
        }

        Ok(Self {
            position,
            duration,
            pitch_offset,
            intensity,
            muted: false,
        })
    }

    /// Same note, muted or not
    pub fn with_muted(self, muted: bool) -> Self {
        Self { muted, ..self }
    }

    /// Position in beats from the pattern start
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Duration in beats
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// End position in beats from the pattern start
    pub fn end(&self) -> f64 {
        self.position + self.duration
    }

    pub fn pitch_offset(&self) -> i32 {
        self.pitch_offset
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Absolute pitch for a given root
    pub fn pitch(&self, root: Pitch) -> Pitch {
        root + self.pitch_offset
    }
}
