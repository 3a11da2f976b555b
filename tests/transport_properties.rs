//! Clock properties under randomized host update loops
//!
//! Exactly-once beat dispatch, timestamp mapping, tempo changes and
//! stop/start behaviour, driven the way a host frame loop would drive them.

use beatclock::sequencer::{BeatIndex, BeatListener, ClockContext, ClockSettings, TransportClock};
use rand::Rng;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct BeatRecorder {
    beats: Vec<BeatIndex>,
    timestamps: Vec<f64>,
}

impl BeatListener for BeatRecorder {
    fn on_beat(&mut self, beat: BeatIndex, clock: &mut ClockContext<'_>) {
        self.beats.push(beat);
        self.timestamps.push(clock.timestamp(beat as f64));
    }
}

fn attach_recorder(clock: &mut TransportClock) -> Rc<RefCell<BeatRecorder>> {
    let recorder = Rc::new(RefCell::new(BeatRecorder::default()));
    clock.attach(recorder.clone());
    recorder
}

fn assert_contiguous_from(beats: &[BeatIndex], first: BeatIndex) {
    for (i, beat) in beats.iter().enumerate() {
        assert_eq!(*beat, first + i as BeatIndex, "gap or repeat at index {i}");
    }
}

/// Random frame deltas, including long hitches covering several beats
#[test]
fn test_random_deltas_dispatch_every_beat_exactly_once() {
    let mut rng = rand::thread_rng();

    for _ in 0..50 {
        let mut clock = TransportClock::new(ClockSettings::default()).unwrap();
        clock.set_tempo(rng.gen_range(40.0..300.0)).unwrap();
        let recorder = attach_recorder(&mut clock);

        let mut now = rng.gen_range(0.0..100.0);
        clock.start(now);

        for _ in 0..500 {
            let delta = if rng.gen_bool(0.02) {
                rng.gen_range(0.5..3.0)
            } else {
                rng.gen_range(0.0..0.05)
            };
            now += delta;
            clock.advance(delta, now);
        }

        let recorder = recorder.borrow();
        assert!(!recorder.beats.is_empty());
        assert_contiguous_from(&recorder.beats, 0);

        // Every dispatched beat lies before the current position
        let last = *recorder.beats.last().unwrap();
        assert!((last as f64) < clock.position());
        assert!(((last + 1) as f64) >= clock.position());
    }
}

/// Timestamps of dispatched beats never decrease across advances
#[test]
fn test_dispatched_timestamps_are_monotonic() {
    let mut rng = rand::thread_rng();
    let mut clock = TransportClock::new(ClockSettings::default()).unwrap();
    let recorder = attach_recorder(&mut clock);

    let mut now = 0.0;
    clock.start(now);
    for _ in 0..1000 {
        let delta = rng.gen_range(0.001..0.1);
        now += delta;
        clock.advance(delta, now);
    }

    let recorder = recorder.borrow();
    for pair in recorder.timestamps.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    // 120 BPM: beats are half a second apart
    for pair in recorder.timestamps.windows(2) {
        assert!((pair[1] - pair[0] - 0.5).abs() < 1e-6);
    }
}

#[test]
fn test_timestamp_of_position_is_last_real_time() {
    let mut rng = rand::thread_rng();
    let mut clock = TransportClock::new(ClockSettings::default()).unwrap();

    let mut now = 10.0;
    clock.start(now);
    for _ in 0..100 {
        let delta = rng.gen_range(0.0..0.05);
        now += delta;
        clock.advance(delta, now);

        let position = clock.position();
        assert!((clock.timestamp(position) - clock.last_real_time()).abs() < 1e-9);
        assert!(clock.timestamp(position + 0.25) < clock.timestamp(position + 0.5));
        assert!(clock.timestamp(position - 1.0) < clock.timestamp(position));
    }
}

#[test]
fn test_tempo_change_halves_accumulation_rate() {
    let settings = ClockSettings {
        lookahead_multiplier: 1.0,
        max_lookahead: 1.0,
        start_margin: 0.0,
        diagnostic_interval: 1.0,
    };
    let mut clock = TransportClock::new(settings).unwrap();
    let recorder = attach_recorder(&mut clock);

    clock.start(0.0);
    let mut now = 0.0;
    for _ in 0..32 {
        now += 0.0625;
        clock.advance(0.0, now);
    }
    // 2 seconds at 120 BPM
    let before = clock.position();
    assert_eq!(before, 4.0);

    clock.set_tempo(60.0).unwrap();
    assert_eq!(clock.position(), before);

    for _ in 0..32 {
        now += 0.0625;
        clock.advance(0.0, now);
    }
    // 2 more seconds at 60 BPM
    assert!((clock.position() - (before + 2.0)).abs() < 1e-9);

    let recorder = recorder.borrow();
    assert_contiguous_from(&recorder.beats, 0);
    assert_eq!(recorder.beats.len(), 6);
    // Beat 5 is one second after beat 4
    assert!((recorder.timestamps[5] - recorder.timestamps[4] - 1.0).abs() < 1e-9);
}

#[test]
fn test_stop_start_restarts_from_beat_zero() {
    let mut clock = TransportClock::new(ClockSettings::default()).unwrap();
    let recorder = attach_recorder(&mut clock);

    let mut now = 0.0;
    clock.start(now);
    for _ in 0..120 {
        now += 1.0 / 60.0;
        clock.advance(1.0 / 60.0, now);
    }
    let first_run = recorder.borrow().beats.len();
    assert!(first_run >= 4);

    clock.stop();
    assert_eq!(clock.position(), 0.0);
    // Ticks while stopped are ignored
    assert!(clock.advance(1.0 / 60.0, now + 1.0).is_empty());

    now += 5.0;
    clock.start(now);
    for _ in 0..30 {
        now += 1.0 / 60.0;
        clock.advance(1.0 / 60.0, now);
    }

    let recorder = recorder.borrow();
    let second_run = &recorder.beats[first_run..];
    assert!(!second_run.is_empty());
    assert_contiguous_from(second_run, 0);
    // Beat zero of the new run is never scheduled before the restart
    assert!(recorder.timestamps[first_run] >= now - 0.5 - 1e-9);
}

#[test]
fn test_backwards_host_time_never_replays_beats() {
    let mut rng = rand::thread_rng();
    let mut clock = TransportClock::new(ClockSettings::default()).unwrap();
    let recorder = attach_recorder(&mut clock);

    let mut now = 0.0;
    clock.start(now);
    for _ in 0..500 {
        let delta = rng.gen_range(0.0..0.05);
        if rng.gen_bool(0.1) {
            // Jittery host clock
            clock.advance(delta, now - delta);
        } else {
            now += delta;
            clock.advance(delta, now);
        }
    }

    assert_contiguous_from(&recorder.borrow().beats, 0);
}
