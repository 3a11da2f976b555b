// Transport - Playback control and state management
// Controls play/pause/stop state on top of the transport clock

use super::clock::TransportClock;
use super::listener::{ListenerId, SharedListener};
use super::timeline::{BeatIndex, Tempo};
use super::TransportResult;
use crate::messaging::NotificationProducer;
use std::ops::Range;

/// Transport state (play/pause/stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    /// Check if transport is stopped or paused
    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped | TransportState::Paused)
    }
}

/// Transport controller
///
/// Owns the session clock. Pausing keeps the playhead, stopping rewinds it to
/// zero; both silence listeners through [`super::BeatListener::on_stop`].
pub struct Transport {
    clock: TransportClock,
    state: TransportState,
}

impl Transport {
    pub fn new(clock: TransportClock) -> Self {
        Self {
            clock,
            state: TransportState::Stopped,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Play from the current position, anchored at host time `now`
    pub fn play(&mut self, now: f64) {
        if self.state.is_playing() {
            return;
        }
        self.clock.start(now);
        self.state = TransportState::Playing;
        tracing::info!(position = self.clock.position(), "playback started");
    }

    /// Pause (keep current position)
    pub fn pause(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        self.clock.pause();
        self.state = TransportState::Paused;
        tracing::info!(position = self.clock.position(), "playback paused");
    }

    /// Stop (reset position to 0)
    pub fn stop(&mut self) {
        let was_stopped = self.state == TransportState::Stopped;
        self.clock.stop();
        self.state = TransportState::Stopped;
        if !was_stopped {
            tracing::info!("playback stopped");
        }
    }

    /// Toggle play/pause
    pub fn toggle_play(&mut self, now: f64) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Host update tick; advances the clock only while playing
    pub fn update(&mut self, host_delta: f64, now: f64) -> Range<BeatIndex> {
        if !self.state.is_playing() {
            return 0..0;
        }
        self.clock.advance(host_delta, now)
    }

    /// Current position in beats
    pub fn position(&self) -> f64 {
        self.clock.position()
    }

    /// Seek; playback continues from the next integer beat
    pub fn set_position(&mut self, position: f64) -> TransportResult<()> {
        self.clock.set_position(position)
    }

    pub fn tempo(&self) -> Tempo {
        self.clock.tempo()
    }

    pub fn set_tempo(&mut self, bpm: f64) -> TransportResult<()> {
        self.clock.set_tempo(bpm)
    }

    pub fn attach(&mut self, listener: SharedListener) -> ListenerId {
        self.clock.attach(listener)
    }

    pub fn detach(&mut self, id: ListenerId) -> bool {
        self.clock.detach(id)
    }

    pub fn is_attached(&self, id: ListenerId) -> bool {
        self.clock.is_attached(id)
    }

    /// Route clock diagnostics to the UI thread
    pub fn set_notification_sender(&mut self, tx: NotificationProducer) {
        self.clock.set_notification_sender(tx);
    }

    /// Read-only view of the clock; run state changes go through the transport
    pub fn clock(&self) -> &TransportClock {
        &self.clock
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(TransportClock::default())
    }
}
