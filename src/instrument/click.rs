// Click instrument - tick generator used by the metronome
// Renders short decaying sine clicks, pre-generated per pitch for low CPU overhead

use crate::instrument::Instrument;
use crate::sequencer::timeline::{Pitch, pitch_frequency};
use std::collections::HashMap;
use std::f32::consts::PI;

/// Click currently sounding
#[derive(Debug, Clone)]
struct ClickPlayback {
    pitch: Pitch,
    gain: f32,
    delay: usize,    // Samples left before the click starts
    position: usize, // Current position in click buffer
}

/// Click waiting for its timestamp
#[derive(Debug, Clone, Copy)]
struct PendingClick {
    timestamp: f64,
    pitch: Pitch,
    gain: f32,
}

/// One-shot percussive instrument
///
/// Note-ons start a click, note-offs are ignored (a click always plays out).
/// Both immediate and timestamped note-ons are supported; timestamped clicks
/// start at the matching sample of the buffer passed to [`ClickInstrument::render`].
#[derive(Debug, Clone)]
pub struct ClickInstrument {
    sample_rate: f32,
    volume: f32,
    click_samples: usize,
    clicks: HashMap<Pitch, Vec<f32>>,
    active: Vec<ClickPlayback>,
    pending: Vec<PendingClick>,
}

impl ClickInstrument {
    /// Duration of click in milliseconds
    const CLICK_DURATION_MS: f32 = 10.0;

    /// Peak amplitude of a full-intensity click
    const CLICK_AMPLITUDE: f32 = 0.6;

    pub fn new(sample_rate: f32) -> Self {
        let click_samples = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate) as usize;

        Self {
            sample_rate,
            volume: 0.5,
            click_samples,
            clicks: HashMap::new(),
            active: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Generate a short click sound using sine wave with envelope
    fn generate_click(sample_rate: f32, num_samples: usize, frequency: f32) -> Vec<f32> {
        let phase_increment = 2.0 * PI * frequency / sample_rate;

        (0..num_samples)
            .map(|i| {
                // Exponential decay envelope
                let t = i as f32 / num_samples as f32;
                let envelope = (-t * 8.0).exp();
                (i as f32 * phase_increment).sin() * envelope * Self::CLICK_AMPLITUDE
            })
            .collect()
    }

    fn ensure_click(&mut self, pitch: Pitch) {
        let (sample_rate, num_samples) = (self.sample_rate, self.click_samples);
        self.clicks.entry(pitch).or_insert_with(|| {
            Self::generate_click(sample_rate, num_samples, pitch_frequency(pitch) as f32)
        });
    }

    /// Set output volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Duration of one click in samples
    pub fn click_duration(&self) -> usize {
        self.click_samples
    }

    /// True while a click is sounding or waiting for its timestamp
    pub fn is_busy(&self) -> bool {
        !self.active.is_empty() || !self.pending.is_empty()
    }

    /// Render one mono buffer whose first sample sounds at host time `buffer_start`
    pub fn render(&mut self, output: &mut [f32], buffer_start: f64) {
        output.fill(0.0);

        let sample_rate = self.sample_rate as f64;
        let buffer_end = buffer_start + output.len() as f64 / sample_rate;

        // Pending clicks are sorted, so everything due in this buffer is a prefix
        let due = self.pending.partition_point(|p| p.timestamp < buffer_end);
        for click in self.pending.drain(..due) {
            let delay =
                ((click.timestamp - buffer_start) * sample_rate).round().max(0.0) as usize;
            self.active.push(ClickPlayback {
                pitch: click.pitch,
                gain: click.gain,
                delay,
                position: 0,
            });
        }

        for playback in self.active.iter_mut() {
            let Some(click) = self.clicks.get(&playback.pitch) else {
                continue;
            };

            let mut index = playback.delay.min(output.len());
            playback.delay -= index;

            while index < output.len() && playback.position < click.len() {
                output[index] += click[playback.position] * playback.gain * self.volume;
                playback.position += 1;
                index += 1;
            }
        }

        let clicks = &self.clicks;
        self.active.retain(|p| {
            clicks
                .get(&p.pitch)
                .is_some_and(|click| p.position < click.len())
        });
    }

    /// Drop every sounding and pending click
    pub fn reset(&mut self) {
        self.active.clear();
        self.pending.clear();
    }
}

impl Instrument for ClickInstrument {
    fn schedule_note_on(&mut self, timestamp: f64, pitch: Pitch, intensity: f64) {
        self.ensure_click(pitch);
        let index = self.pending.partition_point(|p| p.timestamp <= timestamp);
        self.pending.insert(
            index,
            PendingClick {
                timestamp,
                pitch,
                gain: intensity.clamp(0.0, 1.0) as f32,
            },
        );
    }

    fn schedule_note_off(&mut self, _timestamp: f64, _pitch: Pitch) {}

    fn set_note_on(&mut self, pitch: Pitch, intensity: f64) {
        self.ensure_click(pitch);
        self.active.push(ClickPlayback {
            pitch,
            gain: intensity.clamp(0.0, 1.0) as f32,
            delay: 0,
            position: 0,
        });
    }

    fn set_note_off(&mut self, _pitch: Pitch) {}

    fn set_all_notes_off(&mut self) {
        self.reset();
    }
}
