// Instrument - boundary to whatever actually makes sound
// The scheduler only ever calls these methods; it never inspects instrument internals.

pub mod click;
pub mod queue;

pub use click::ClickInstrument;
pub use queue::QueuedInstrument;

use crate::sequencer::timeline::Pitch;
use std::cell::RefCell;
use std::rc::Rc;

/// Note event handed to an instrument
///
/// `timestamp` is the host real time in seconds at which the event must sound,
/// or `None` for events that take effect immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstrumentEvent {
    NoteOn {
        timestamp: Option<f64>,
        pitch: Pitch,
        intensity: f64,
    },
    NoteOff {
        timestamp: Option<f64>,
        pitch: Pitch,
    },
    AllNotesOff,
}

impl InstrumentEvent {
    pub fn pitch(&self) -> Option<Pitch> {
        match self {
            InstrumentEvent::NoteOn { pitch, .. } | InstrumentEvent::NoteOff { pitch, .. } => {
                Some(*pitch)
            }
            InstrumentEvent::AllNotesOff => None,
        }
    }

    pub fn timestamp(&self) -> Option<f64> {
        match self {
            InstrumentEvent::NoteOn { timestamp, .. }
            | InstrumentEvent::NoteOff { timestamp, .. } => *timestamp,
            InstrumentEvent::AllNotesOff => None,
        }
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, InstrumentEvent::NoteOn { .. })
    }

    pub fn is_note_off(&self) -> bool {
        matches!(self, InstrumentEvent::NoteOff { .. })
    }
}

/// Instrument collaborator driven by sequencers and metronomes
///
/// Calls are synchronous and made from the control thread. Implementations that
/// render audio elsewhere are expected to hand events over without blocking
/// (see [`QueuedInstrument`]).
pub trait Instrument {
    /// Start `pitch` at host time `timestamp` (seconds)
    fn schedule_note_on(&mut self, timestamp: f64, pitch: Pitch, intensity: f64);

    /// Stop `pitch` at host time `timestamp` (seconds)
    fn schedule_note_off(&mut self, timestamp: f64, pitch: Pitch);

    /// Start `pitch` now
    fn set_note_on(&mut self, pitch: Pitch, intensity: f64);

    /// Stop `pitch` now
    fn set_note_off(&mut self, pitch: Pitch);

    /// Silence everything, including notes scheduled in the future
    fn set_all_notes_off(&mut self) {}
}

impl<I: Instrument + ?Sized> Instrument for Box<I> {
    fn schedule_note_on(&mut self, timestamp: f64, pitch: Pitch, intensity: f64) {
        (**self).schedule_note_on(timestamp, pitch, intensity);
    }

    fn schedule_note_off(&mut self, timestamp: f64, pitch: Pitch) {
        (**self).schedule_note_off(timestamp, pitch);
    }

    fn set_note_on(&mut self, pitch: Pitch, intensity: f64) {
        (**self).set_note_on(pitch, intensity);
    }

    fn set_note_off(&mut self, pitch: Pitch) {
        (**self).set_note_off(pitch);
    }

    fn set_all_notes_off(&mut self) {
        (**self).set_all_notes_off();
    }
}

/// Shared instrument, e.g. one synth driven by several sequencers
impl<I: Instrument + ?Sized> Instrument for Rc<RefCell<I>> {
    fn schedule_note_on(&mut self, timestamp: f64, pitch: Pitch, intensity: f64) {
        self.borrow_mut().schedule_note_on(timestamp, pitch, intensity);
    }

    fn schedule_note_off(&mut self, timestamp: f64, pitch: Pitch) {
        self.borrow_mut().schedule_note_off(timestamp, pitch);
    }

    fn set_note_on(&mut self, pitch: Pitch, intensity: f64) {
        self.borrow_mut().set_note_on(pitch, intensity);
    }

    fn set_note_off(&mut self, pitch: Pitch) {
        self.borrow_mut().set_note_off(pitch);
    }

    fn set_all_notes_off(&mut self) {
        self.borrow_mut().set_all_notes_off();
    }
}

/// Instrument that records every call it receives
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<InstrumentEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in call order
    pub fn events(&self) -> &[InstrumentEvent] {
        &self.events
    }

    /// Recorded note-ons only
    pub fn note_ons(&self) -> impl Iterator<Item = &InstrumentEvent> {
        self.events.iter().filter(|e| e.is_note_on())
    }

    /// Recorded note-offs only
    pub fn note_offs(&self) -> impl Iterator<Item = &InstrumentEvent> {
        self.events.iter().filter(|e| e.is_note_off())
    }

    /// Drain recorded events
    pub fn take(&mut self) -> Vec<InstrumentEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Instrument for EventLog {
    fn schedule_note_on(&mut self, timestamp: f64, pitch: Pitch, intensity: f64) {
        self.events.push(InstrumentEvent::NoteOn {
            timestamp: Some(timestamp),
            pitch,
            intensity,
        });
    }

    fn schedule_note_off(&mut self, timestamp: f64, pitch: Pitch) {
        self.events.push(InstrumentEvent::NoteOff {
            timestamp: Some(timestamp),
            pitch,
        });
    }

    fn set_note_on(&mut self, pitch: Pitch, intensity: f64) {
        self.events.push(InstrumentEvent::NoteOn {
            timestamp: None,
            pitch,
            intensity,
        });
    }

    fn set_note_off(&mut self, pitch: Pitch) {
        self.events.push(InstrumentEvent::NoteOff {
            timestamp: None,
            pitch,
        });
    }

    fn set_all_notes_off(&mut self) {
        self.events.push(InstrumentEvent::AllNotesOff);
    }
}
