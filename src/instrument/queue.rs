// Queued instrument - hands note events to the audio thread through a lock-free ringbuffer

use crate::instrument::{Instrument, InstrumentEvent};
use crate::messaging::channels::{EventConsumer, EventProducer, create_event_channel};
use crate::sequencer::timeline::Pitch;

/// Instrument that forwards every call as an [`InstrumentEvent`]
///
/// The consumer half lives on the audio thread; pushes never block. When the
/// ringbuffer is full the event is dropped and counted.
pub struct QueuedInstrument {
    tx: EventProducer,
    dropped: u64,
}

impl QueuedInstrument {
    pub fn new(tx: EventProducer) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Create an instrument together with the consumer the audio thread reads from
    pub fn with_capacity(capacity: usize) -> (Self, EventConsumer) {
        let (tx, rx) = create_event_channel(capacity);
        (Self::new(tx), rx)
    }

    /// Number of events lost to a full ringbuffer
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn push(&mut self, event: InstrumentEvent) {
        if ringbuf::traits::Producer::try_push(&mut self.tx, event).is_err() {
            self.dropped += 1;
            if self.dropped.is_power_of_two() {
                tracing::warn!(dropped = self.dropped, "instrument event queue full");
            }
        }
    }
}

impl Instrument for QueuedInstrument {
    fn schedule_note_on(&mut self, timestamp: f64, pitch: Pitch, intensity: f64) {
        self.push(InstrumentEvent::NoteOn {
            timestamp: Some(timestamp),
            pitch,
            intensity,
        });
    }

    fn schedule_note_off(&mut self, timestamp: f64, pitch: Pitch) {
        self.push(InstrumentEvent::NoteOff {
            timestamp: Some(timestamp),
            pitch,
        });
    }

    fn set_note_on(&mut self, pitch: Pitch, intensity: f64) {
        self.push(InstrumentEvent::NoteOn {
            timestamp: None,
            pitch,
            intensity,
        });
    }

    fn set_note_off(&mut self, pitch: Pitch) {
        self.push(InstrumentEvent::NoteOff {
            timestamp: None,
            pitch,
        });
    }

    fn set_all_notes_off(&mut self) {
        self.push(InstrumentEvent::AllNotesOff);
    }
}
