// beatclock - Transport clock and beat-quantized scheduling
// Library exports for the binary, tests and benchmarks

pub mod config;
pub mod instrument;
pub mod messaging;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use config::{ConfigError, SessionConfig};
pub use instrument::{ClickInstrument, EventLog, Instrument, InstrumentEvent, QueuedInstrument};
pub use messaging::channels::{create_event_channel, create_notification_channel};
pub use sequencer::{
    BeatListener, ClickType, ClockContext, ClockSettings, ListenerId, Metronome, Note, Pattern,
    PatternWindow, Sequencer, Tempo, Transport, TransportClock, TransportError, TransportState,
};
