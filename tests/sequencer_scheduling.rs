//! End-to-end scheduling through the transport
//!
//! Sequencers and a metronome attached to one clock, driven by a 60 fps host
//! loop, with instruments recording what they were asked to play.

use beatclock::messaging::create_event_channel;
use beatclock::sequencer::{
    BarBeat, ClickType, ClockSettings, Metronome, Note, PatternWindow, Sequencer, Transport,
    TransportClock,
};
use beatclock::{EventLog, InstrumentEvent, QueuedInstrument};
use ringbuf::traits::Consumer;
use std::cell::RefCell;
use std::rc::Rc;

const FRAME: f64 = 1.0 / 60.0;

fn transport() -> Transport {
    Transport::new(TransportClock::new(ClockSettings::default()).unwrap())
}

/// Run the host loop from `start` for `seconds`; returns the final host time
fn run(transport: &mut Transport, start: f64, seconds: f64) -> f64 {
    let frames = (seconds / FRAME).round() as usize;
    let mut now = start;
    for _ in 0..frames {
        now += FRAME;
        transport.update(FRAME, now);
    }
    now
}

fn sequencer(window: PatternWindow, notes: &[Note]) -> Rc<RefCell<Sequencer<EventLog>>> {
    let mut sequencer = Sequencer::new(EventLog::new(), window);
    for note in notes {
        sequencer.add_note(*note);
    }
    Rc::new(RefCell::new(sequencer))
}

fn note_on_times(log: &EventLog) -> Vec<f64> {
    log.note_ons().filter_map(|e| e.timestamp()).collect()
}

#[test]
fn test_looping_pattern_fires_once_per_cycle() {
    let mut transport = transport();
    let seq = sequencer(
        PatternWindow::new(0.0, 4, true).unwrap(),
        &[Note::new(0.0, 0.5, 0, 1.0).unwrap()],
    );
    transport.attach(seq.clone());

    transport.play(0.0);
    // 120 BPM: 6 seconds covers beats 0..=11
    run(&mut transport, 0.0, 6.0);

    let seq = seq.borrow();
    let times = note_on_times(seq.instrument());
    assert_eq!(times.len(), 3);

    // Beats 0, 4 and 8: two seconds apart, starting at the start margin
    let margin = ClockSettings::default().start_margin;
    for (i, t) in times.iter().enumerate() {
        assert!((t - (margin + 2.0 * i as f64)).abs() < 1e-6);
    }
    assert_eq!(seq.instrument().note_offs().count(), 3);
}

#[test]
fn test_bounded_pattern_plays_only_inside_window() {
    let mut transport = transport();
    let notes: Vec<Note> = (0..4)
        .map(|i| Note::new(i as f64, 0.5, i, 0.8).unwrap())
        .collect();
    let seq = sequencer(PatternWindow::new(2.0, 4, false).unwrap(), &notes);
    transport.attach(seq.clone());

    transport.play(0.0);
    run(&mut transport, 0.0, 10.0);

    let seq = seq.borrow();
    let pitches: Vec<_> = seq
        .instrument()
        .note_ons()
        .filter_map(|e| e.pitch())
        .collect();
    assert_eq!(pitches, vec![60, 61, 62, 63]);

    // Absolute beats 2..6, half a second apart
    let times = note_on_times(seq.instrument());
    let margin = ClockSettings::default().start_margin;
    for (i, t) in times.iter().enumerate() {
        assert!((t - (margin + 1.0 + 0.5 * i as f64)).abs() < 1e-6);
    }
}

#[test]
fn test_notes_are_scheduled_ahead_of_their_sounding_time() {
    let mut transport = transport();
    let seq = sequencer(
        PatternWindow::default(),
        &[
            Note::new(0.0, 1.0, 0, 1.0).unwrap(),
            Note::new(2.5, 0.25, 5, 1.0).unwrap(),
        ],
    );
    transport.attach(seq.clone());

    transport.play(0.0);
    let mut now = 0.0;
    let mut seen = 0;
    for _ in 0..600 {
        now += FRAME;
        transport.update(FRAME, now);

        let seq = seq.borrow();
        for event in &seq.instrument().events()[seen..] {
            // Never scheduled in the past
            assert!(event.timestamp().is_some_and(|t| t >= now - 1e-9));
        }
        seen = seq.instrument().len();
    }
    assert!(seen > 0);
}

#[test]
fn test_metronome_counts_bars_and_accents_downbeats() {
    let mut transport = transport();
    let (instrument, mut rx) = QueuedInstrument::with_capacity(256);
    let metronome = Rc::new(RefCell::new(Metronome::new(instrument)));
    let ticks = Rc::new(RefCell::new(Vec::new()));
    {
        let ticks = ticks.clone();
        metronome
            .borrow_mut()
            .on_bar_beat(move |tick| ticks.borrow_mut().push(tick));
    }
    transport.attach(metronome.clone());

    transport.play(0.0);
    run(&mut transport, 0.0, 4.0);

    let ticks = ticks.borrow();
    assert!(ticks.len() >= 8);
    assert_eq!(ticks[7].bar_beat, BarBeat { bar: 1, beat: 3 });
    assert_eq!(ticks[0].click, ClickType::Accent);
    assert_eq!(ticks[0].pitch, Metronome::<QueuedInstrument>::DEFAULT_BAR_PITCH);
    assert_eq!(ticks[4].click, ClickType::Accent);
    assert_eq!(ticks[5].click, ClickType::Regular);

    // Immediate on/off pairs, one per beat
    let mut events = Vec::new();
    while let Some(event) = rx.try_pop() {
        events.push(event);
    }
    assert_eq!(events.len(), ticks.len() * 2);
    assert_eq!(
        events[0],
        InstrumentEvent::NoteOn {
            timestamp: None,
            pitch: 72,
            intensity: 1.0
        }
    );
    assert_eq!(
        events[1],
        InstrumentEvent::NoteOff {
            timestamp: None,
            pitch: 72
        }
    );
}

#[test]
fn test_shared_instrument_receives_all_sequencers() {
    let mut transport = transport();
    let shared = Rc::new(RefCell::new(EventLog::new()));

    let mut bass = Sequencer::new(shared.clone(), PatternWindow::default());
    bass.set_root_pitch(36);
    bass.add_note(Note::new(0.0, 1.0, 0, 1.0).unwrap());
    let mut lead = Sequencer::new(shared.clone(), PatternWindow::default());
    lead.set_root_pitch(72);
    lead.add_note(Note::new(0.0, 1.0, 0, 1.0).unwrap());

    transport.attach(Rc::new(RefCell::new(bass)));
    transport.attach(Rc::new(RefCell::new(lead)));

    transport.play(0.0);
    run(&mut transport, 0.0, 0.5);

    let pitches: Vec<_> = shared
        .borrow()
        .note_ons()
        .filter_map(|e| e.pitch())
        .collect();
    // Attach order is dispatch order
    assert_eq!(pitches, vec![36, 72]);
}

#[test]
fn test_pause_silences_and_resume_continues() {
    let mut transport = transport();
    let (tx, mut rx) = create_event_channel(256);
    let mut sequencer = Sequencer::new(QueuedInstrument::new(tx), PatternWindow::default());
    for beat in 0..4 {
        sequencer.add_note(Note::new(beat as f64, 0.5, beat, 1.0).unwrap());
    }
    transport.attach(Rc::new(RefCell::new(sequencer)));

    transport.play(0.0);
    let now = run(&mut transport, 0.0, 0.75);
    transport.pause();

    let mut events = Vec::new();
    while let Some(event) = rx.try_pop() {
        events.push(event);
    }
    assert_eq!(events.last(), Some(&InstrumentEvent::AllNotesOff));
    let played: Vec<_> = events
        .iter()
        .filter(|e| e.is_note_on())
        .filter_map(|e| e.pitch())
        .collect();

    // Resume well after the pause; nothing missed, nothing replayed
    transport.play(now + 30.0);
    run(&mut transport, now + 30.0, 1.5);
    let mut resumed = Vec::new();
    while let Some(event) = rx.try_pop() {
        if event.is_note_on() {
            resumed.extend(event.pitch());
        }
    }

    let all: Vec<_> = played.iter().chain(resumed.iter()).copied().collect();
    assert_eq!(&all[..4], &[60, 61, 62, 63]);
}
