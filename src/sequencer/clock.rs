// Transport clock - maps host real time to musical position
// Advances once per host update tick and dispatches every crossed beat exactly once

use super::listener::{ListenerId, ListenerSet, SharedListener};
use super::timeline::{BeatIndex, Tempo, beats_crossed};
use super::{TransportError, TransportResult};
use crate::messaging::channels::NotificationProducer;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::messaging::throttle::DiagnosticThrottle;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Tunable scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Lookahead as a multiple of the host frame delta (k >= 1)
    pub lookahead_multiplier: f64,
    /// Upper bound of one lookahead window in seconds (hitches, pauses)
    pub max_lookahead: f64,
    /// Offset added to the host time on start so first events land in the future
    pub start_margin: f64,
    /// Minimum host time in seconds between two repeated diagnostics
    pub diagnostic_interval: f64,
}

impl ClockSettings {
    pub fn validate(&self) -> TransportResult<()> {
        if !self.lookahead_multiplier.is_finite() || self.lookahead_multiplier < 1.0 {
            return Err(TransportError::InvalidSettings(format!(
                "lookahead multiplier must be >= 1, got {}",
                self.lookahead_multiplier
            )));
        }
        if !self.max_lookahead.is_finite() || self.max_lookahead <= 0.0 {
            return Err(TransportError::InvalidSettings(format!(
                "max lookahead must be > 0, got {}",
                self.max_lookahead
            )));
        }
        if !self.start_margin.is_finite() || self.start_margin < 0.0 {
            return Err(TransportError::InvalidSettings(format!(
                "start margin must be >= 0, got {}",
                self.start_margin
            )));
        }
        if !self.diagnostic_interval.is_finite() || self.diagnostic_interval < 0.0 {
            return Err(TransportError::InvalidSettings(format!(
                "diagnostic interval must be >= 0, got {}",
                self.diagnostic_interval
            )));
        }
        Ok(())
    }
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            lookahead_multiplier: 2.0,
            max_lookahead: 0.1,
            start_margin: 0.05,
            diagnostic_interval: 1.0,
        }
    }
}

/// Linear mapping between musical position and host time at constant tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMapping {
    /// Anchor position in beats
    pub position: f64,
    /// Host time in seconds of the anchor position
    pub real_time: f64,
    pub tempo: Tempo,
}

impl TimeMapping {
    /// Host time (seconds) at which `position` (beats) sounds
    pub fn timestamp(&self, position: f64) -> f64 {
        self.real_time + self.tempo.beats_to_seconds(position - self.position)
    }
}

/// Session transport clock
///
/// Owned by the host and advanced from a single control thread. Listeners are
/// attached as shared handles and called synchronously from [`TransportClock::advance`].
pub struct TransportClock {
    settings: ClockSettings,
    tempo: Tempo,
    running: bool,
    position: f64,
    last_real_time: f64,
    last_host_time: Option<f64>,
    listeners: ListenerSet,
    throttle: DiagnosticThrottle,
    notifications: Option<NotificationProducer>,
}

impl TransportClock {
    /// Furthest position the clock will seek or advance to (2^53 beats)
    pub const MAX_POSITION: f64 = 9_007_199_254_740_992.0;

    pub fn new(settings: ClockSettings) -> TransportResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            tempo: Tempo::default(),
            running: false,
            position: 0.0,
            last_real_time: 0.0,
            last_host_time: None,
            listeners: ListenerSet::default(),
            throttle: DiagnosticThrottle::new(settings.diagnostic_interval),
            notifications: None,
        })
    }

    /// Route diagnostics to the host UI in addition to the log
    pub fn set_notification_sender(&mut self, tx: NotificationProducer) {
        self.notifications = Some(tx);
    }

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current position in beats
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Host time (seconds) the current position corresponds to
    pub fn last_real_time(&self) -> f64 {
        self.last_real_time
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Current beat/time mapping
    pub fn mapping(&self) -> TimeMapping {
        TimeMapping {
            position: self.position,
            real_time: self.last_real_time,
            tempo: self.tempo,
        }
    }

    /// Host time (seconds) at which `position` (beats) sounds at the current tempo
    pub fn timestamp(&self, position: f64) -> f64 {
        self.mapping().timestamp(position)
    }

    /// Change tempo from the next advance on; past position is never recomputed
    pub fn set_tempo(&mut self, bpm: f64) -> TransportResult<()> {
        match Tempo::new(bpm) {
            Ok(tempo) => {
                if tempo != self.tempo {
                    tracing::debug!(from = self.tempo.bpm(), to = bpm, "tempo changed");
                }
                self.tempo = tempo;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(bpm, kept = self.tempo.bpm(), "rejected tempo change");
                let message = format!("{err}, keeping {}", self.tempo);
                self.notify(NotificationCategory::Tempo, message);
                Err(err)
            }
        }
    }

    /// Seek to `position` beats; dispatch resumes at the next integer beat
    pub fn set_position(&mut self, position: f64) -> TransportResult<()> {
        if !position.is_finite() || !(0.0..=Self::MAX_POSITION).contains(&position) {
            return Err(TransportError::InvalidPosition(position));
        }
        self.position = position;
        Ok(())
    }

    /// Start advancing, anchoring the current position slightly after `now`
    pub fn start(&mut self, now: f64) {
        if self.running {
            return;
        }
        self.last_real_time = now + self.settings.start_margin;
        self.last_host_time = Some(now);
        self.running = true;
        tracing::debug!(now, position = self.position, "clock started");
    }

    /// Stop advancing and reset the position to zero
    pub fn stop(&mut self) {
        self.halt();
        self.position = 0.0;
    }

    /// Stop advancing but keep the position; the next start resumes from it
    pub fn pause(&mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.last_real_time = 0.0;
        self.last_host_time = None;
        self.throttle.reset();
        self.listeners.notify_stop();
        tracing::debug!(position = self.position, "clock halted");
    }

    /// Advance to host time `now` plus lookahead and dispatch crossed beats.
    ///
    /// Returns the range of beats dispatched by this call (possibly empty).
    pub fn advance(&mut self, host_delta: f64, now: f64) -> Range<BeatIndex> {
        if !self.running {
            return 0..0;
        }

        if !now.is_finite() || !host_delta.is_finite() {
            let at = self.last_host_time.unwrap_or(0.0);
            self.report(
                at,
                format!("ignoring non-finite host time (now={now}, delta={host_delta})"),
            );
            return 0..0;
        }

        if let Some(last) = self.last_host_time
            && now < last
        {
            self.report(
                now,
                format!("host time went backwards ({last:.6}s -> {now:.6}s), tick ignored"),
            );
            return 0..0;
        }

        let lookahead = (self.settings.lookahead_multiplier * host_delta.max(0.0))
            .min(self.settings.max_lookahead);
        let target = now + lookahead;
        let new_position = self.position
            + self
                .tempo
                .seconds_to_beats((target - self.last_real_time).max(0.0));
        if !new_position.is_finite() || new_position > Self::MAX_POSITION {
            self.report(
                now,
                format!("host time jump to {now}s is out of range, tick ignored"),
            );
            return 0..0;
        }

        self.last_host_time = Some(now);
        if target <= self.last_real_time {
            return 0..0;
        }

        let beats = beats_crossed(self.position, new_position);
        if !beats.is_empty() {
            self.listeners.dispatch(beats.clone(), self.mapping());
        }

        self.position = new_position;
        self.last_real_time = target;
        beats
    }

    /// Attach a listener; takes effect immediately
    pub fn attach(&mut self, listener: SharedListener) -> ListenerId {
        self.listeners.attach(listener)
    }

    /// Detach a listener; returns false if it was not attached
    pub fn detach(&mut self, id: ListenerId) -> bool {
        self.listeners.detach(id)
    }

    pub fn is_attached(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Rate-limited clock diagnostic
    fn report(&mut self, now: f64, message: String) {
        if let Some(suppressed) = self.throttle.check(now) {
            tracing::warn!(suppressed, "{message}");
            self.notify(NotificationCategory::Clock, message);
        }
    }

    fn notify(&mut self, category: NotificationCategory, message: String) {
        let at = self.last_host_time.unwrap_or(0.0);
        if let Some(tx) = self.notifications.as_mut() {
            let notification = Notification::warning(category, message, at);
            let _ = ringbuf::traits::Producer::try_push(tx, notification);
        }
    }
}

impl Default for TransportClock {
    fn default() -> Self {
        let settings = ClockSettings::default();
        Self {
            settings,
            tempo: Tempo::default(),
            running: false,
            position: 0.0,
            last_real_time: 0.0,
            last_host_time: None,
            listeners: ListenerSet::default(),
            throttle: DiagnosticThrottle::new(settings.diagnostic_interval),
            notifications: None,
        }
    }
}
