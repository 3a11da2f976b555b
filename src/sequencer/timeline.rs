// Timeline - Musical time representation
// Handles conversion between beats, bars, and real time (seconds)

use super::{TransportError, TransportResult};
use std::fmt;
use std::ops::Range;

/// Absolute beat index since transport start
pub type BeatIndex = i64;

/// Pitch in semitones (12 units per octave, 60 = C4)
pub type Pitch = i32;

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Tempo used when nothing else is configured
    pub const DEFAULT_BPM: f64 = 120.0;

    /// Fastest accepted tempo
    pub const MAX_BPM: f64 = 960.0;

    /// Creates a new tempo
    /// BPM must be strictly positive and at most [`Tempo::MAX_BPM`]
    pub fn new(bpm: f64) -> TransportResult<Self> {
        if !bpm.is_finite() || bpm <= 0.0 || bpm > Self::MAX_BPM {
            return Err(TransportError::InvalidTempo(bpm));
        }
        Ok(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Beats elapsed per second of real time
    pub fn beats_per_second(&self) -> f64 {
        self.bpm / 60.0
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one bar in seconds
    pub fn bar_duration_seconds(&self, beats_per_bar: u32) -> f64 {
        self.beat_duration_seconds() * beats_per_bar as f64
    }

    /// Convert a span of beats into seconds
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats / self.beats_per_second()
    }

    /// Convert a span of seconds into beats
    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.beats_per_second()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: Self::DEFAULT_BPM,
        }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Integer beat boundaries `b` with `from <= b < to`.
///
/// Both ends are rounded up, so a boundary that lands exactly on `to` belongs
/// to the next span. Consecutive spans therefore never share a beat.
pub fn beats_crossed(from: f64, to: f64) -> Range<BeatIndex> {
    let first = from.ceil() as BeatIndex;
    let end = to.ceil() as BeatIndex;
    first..end.max(first)
}

/// Bar/beat counter derived from an absolute beat index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BarBeat {
    /// Bar number (0-based)
    pub bar: i64,
    /// Beat within bar (0-based)
    pub beat: u32,
}

impl BarBeat {
    /// Split an absolute beat index into bar and beat-in-bar
    pub fn from_beat_index(index: BeatIndex, beats_per_bar: u32) -> Self {
        let per_bar = i64::from(beats_per_bar.max(1));
        Self {
            bar: index.div_euclid(per_bar),
            beat: index.rem_euclid(per_bar) as u32,
        }
    }

    /// First beat of a bar (downbeat)
    pub fn is_downbeat(&self) -> bool {
        self.beat == 0
    }
}

impl fmt::Display for BarBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.bar, self.beat)
    }
}

/// Get the note name of a pitch (e.g., "C4", "A#5")
pub fn note_name(pitch: Pitch) -> String {
    const NOTE_NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];

    let octave = pitch.div_euclid(12) - 1;
    let note_index = pitch.rem_euclid(12) as usize;

    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Frequency in hertz of a pitch, A4 (69) = 440 Hz
pub fn pitch_frequency(pitch: Pitch) -> f64 {
    440.0 * 2f64.powf((pitch - 69) as f64 / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo() {
        let tempo = Tempo::new(120.0).unwrap();
        assert_eq!(tempo.bpm(), 120.0);
        assert_eq!(tempo.beat_duration_seconds(), 0.5);
        assert_eq!(tempo.beats_per_second(), 2.0);
        assert_eq!(tempo.bar_duration_seconds(4), 2.0);
        assert_eq!(tempo.to_string(), "120.0 BPM");
    }

    #[test]
    fn test_tempo_conversions() {
        let tempo = Tempo::new(90.0).unwrap();
        assert!((tempo.seconds_to_beats(2.0) - 3.0).abs() < 1e-12);
        assert!((tempo.beats_to_seconds(3.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_tempo() {
        assert!(matches!(
            Tempo::new(0.0),
            Err(TransportError::InvalidTempo(_))
        ));
        assert!(Tempo::new(-60.0).is_err());
        assert!(Tempo::new(f64::NAN).is_err());
        assert!(Tempo::new(f64::INFINITY).is_err());
        assert!(Tempo::new(1e300).is_err());
        assert!(Tempo::new(Tempo::MAX_BPM).is_ok());
        assert!(Tempo::new(Tempo::MAX_BPM + 1.0).is_err());
    }

    #[test]
    fn test_beats_crossed() {
        assert_eq!(beats_crossed(0.0, 0.5), 0..1);
        assert_eq!(beats_crossed(0.5, 0.9), 1..1);
        assert_eq!(beats_crossed(0.5, 3.2), 1..4);
        // A boundary exactly at the end belongs to the next span
        assert_eq!(beats_crossed(0.5, 2.0), 1..2);
        assert_eq!(beats_crossed(2.0, 2.5), 2..3);
        assert!(beats_crossed(3.0, 3.0).is_empty());
    }

    #[test]
    fn test_bar_beat() {
        let bb = BarBeat::from_beat_index(7, 4);
        assert_eq!(bb, BarBeat { bar: 1, beat: 3 });
        assert!(!bb.is_downbeat());

        let first = BarBeat::from_beat_index(0, 4);
        assert_eq!(first, BarBeat { bar: 0, beat: 0 });
        assert!(first.is_downbeat());

        // 3/4 bar
        assert_eq!(BarBeat::from_beat_index(6, 3), BarBeat { bar: 2, beat: 0 });
        assert_eq!(BarBeat::from_beat_index(7, 4).to_string(), "1.3");
    }

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(73), "C#5");
        assert_eq!(note_name(0), "C-1");
    }

    #[test]
    fn test_pitch_frequency() {
        assert!((pitch_frequency(69) - 440.0).abs() < 1e-9);
        assert!((pitch_frequency(81) - 880.0).abs() < 1e-9);
    }
}
