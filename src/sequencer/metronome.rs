// Metronome - Bar/beat counter that ticks an instrument on every beat
// Downbeats use the bar pitch, other beats the beat pitch

use super::listener::{BeatListener, ClockContext};
use super::timeline::{BarBeat, BeatIndex, Pitch};
use super::{TransportError, TransportResult};
use crate::instrument::{ClickInstrument, Instrument};

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

/// What a metronome reports for every beat it counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetronomeTick {
    pub bar_beat: BarBeat,
    pub pitch: Pitch,
    pub click: ClickType,
}

/// Callback invoked on every beat, ticking or not
pub type BarBeatCallback = Box<dyn FnMut(MetronomeTick)>;

/// Metronome listener
///
/// Counts bars and beats from the absolute beat index and plays an immediate
/// note on its tick instrument. Callbacks run even while ticking is disabled,
/// so the metronome can be used as a silent bar/beat counter.
pub struct Metronome<I: Instrument = ClickInstrument> {
    instrument: I,
    beats_per_bar: u32,
    bar_pitch: Pitch,
    beat_pitch: Pitch,
    intensity: f64,
    ticking: bool,
    logging: bool,
    callbacks: Vec<BarBeatCallback>,
}

impl<I: Instrument> Metronome<I> {
    pub const DEFAULT_BEATS_PER_BAR: u32 = 4;
    /// One octave above the beat pitch
    pub const DEFAULT_BAR_PITCH: Pitch = 72;
    pub const DEFAULT_BEAT_PITCH: Pitch = 60;

    /// Create a ticking 4/4 metronome
    pub fn new(instrument: I) -> Self {
        Self {
            instrument,
            beats_per_bar: Self::DEFAULT_BEATS_PER_BAR,
            bar_pitch: Self::DEFAULT_BAR_PITCH,
            beat_pitch: Self::DEFAULT_BEAT_PITCH,
            intensity: 1.0,
            ticking: true,
            logging: false,
            callbacks: Vec::new(),
        }
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn set_beats_per_bar(&mut self, beats_per_bar: u32) -> TransportResult<()> {
        if beats_per_bar == 0 {
            return Err(TransportError::InvalidBeatsPerBar);
        }
        self.beats_per_bar = beats_per_bar;
        Ok(())
    }

    pub fn bar_pitch(&self) -> Pitch {
        self.bar_pitch
    }

    pub fn beat_pitch(&self) -> Pitch {
        self.beat_pitch
    }

    pub fn set_pitches(&mut self, bar_pitch: Pitch, beat_pitch: Pitch) {
        self.bar_pitch = bar_pitch;
        self.beat_pitch = beat_pitch;
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Set tick intensity (0.0 to 1.0)
    pub fn set_intensity(&mut self, intensity: f64) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    /// Enable/disable the audible tick; callbacks keep running
    pub fn set_ticking(&mut self, ticking: bool) {
        self.ticking = ticking;
    }

    pub fn is_logging(&self) -> bool {
        self.logging
    }

    /// Log every tick at debug level
    pub fn set_logging(&mut self, logging: bool) {
        self.logging = logging;
    }

    /// Register a bar/beat callback
    pub fn on_bar_beat(&mut self, callback: impl FnMut(MetronomeTick) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear();
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut I {
        &mut self.instrument
    }

    /// Bar/beat, pitch and click type for an absolute beat
    pub fn tick_for(&self, beat: BeatIndex) -> MetronomeTick {
        let bar_beat = BarBeat::from_beat_index(beat, self.beats_per_bar);
        if bar_beat.is_downbeat() {
            MetronomeTick {
                bar_beat,
                pitch: self.bar_pitch,
                click: ClickType::Accent,
            }
        } else {
            MetronomeTick {
                bar_beat,
                pitch: self.beat_pitch,
                click: ClickType::Regular,
            }
        }
    }
}

impl<I: Instrument> BeatListener for Metronome<I> {
    fn on_beat(&mut self, beat: BeatIndex, _clock: &mut ClockContext<'_>) {
        let tick = self.tick_for(beat);

        if self.ticking {
            self.instrument.set_note_on(tick.pitch, self.intensity);
            self.instrument.set_note_off(tick.pitch);
        }
        if self.logging {
            tracing::debug!("Tick {}", tick.bar_beat);
        }

        for callback in &mut self.callbacks {
            callback(tick);
        }
    }
}
