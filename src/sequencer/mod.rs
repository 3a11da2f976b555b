// Sequencer module
// Transport clock, beat dispatch, and the listeners that turn beats into notes

pub mod clock;
pub mod listener;
pub mod metronome;
pub mod note;
pub mod pattern;
pub mod player;
pub mod timeline;
pub mod transport;

pub use clock::{ClockSettings, TimeMapping, TransportClock};
pub use listener::{BeatListener, ClockContext, ListenerId, SharedListener};
pub use metronome::{BarBeatCallback, ClickType, Metronome, MetronomeTick};
pub use note::Note;
pub use pattern::{Pattern, PatternWindow};
pub use player::Sequencer;
pub use timeline::{BarBeat, BeatIndex, Pitch, Tempo, beats_crossed, note_name};
pub use transport::{Transport, TransportState};

use thiserror::Error;

/// Transport and sequencing errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Invalid tempo: {0} BPM (must be > 0 and <= 960)")]
    InvalidTempo(f64),

    #[error("Invalid position: {0} beats (must be finite and >= 0)")]
    InvalidPosition(f64),

    #[error("Invalid clock settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid note: {0}")]
    InvalidNote(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid intensity: {0} (must be between 0 and 1)")]
    InvalidIntensity(f64),

    #[error("Beats per bar must be at least 1")]
    InvalidBeatsPerBar,
}

pub type TransportResult<T> = Result<T, TransportError>;
