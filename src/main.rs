use beatclock::messaging::{EventConsumer, NotificationConsumer, NotificationLevel};
use beatclock::sequencer::note_name;
use beatclock::{
    InstrumentEvent, QueuedInstrument, SessionConfig, Transport, create_notification_channel,
};
use clap::{Parser, crate_version};
use ringbuf::traits::Consumer;
use std::cell::RefCell;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// Ringbuffer capacity constants
// A full lookahead window at high tempo stays far below these
const EVENT_RINGBUFFER_CAPACITY: usize = 1024;
const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 64;

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "Runs a session through a simulated host update loop and logs scheduled notes."
)]
struct Cli {
    /// Session file (.ron or .json). A default 4/4 metronome session is used otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the session tempo (BPM).
    #[arg(short, long)]
    tempo: Option<f64>,
    /// Simulated host time to run for, in seconds.
    #[arg(short, long, default_value_t = 8.0)]
    seconds: f64,
    /// Host update rate (frames per second).
    #[arg(short, long, default_value_t = 60.0)]
    fps: f64,
    /// Sleep between frames instead of running as fast as possible.
    #[arg(short, long)]
    realtime: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(format!("fps must be > 0, got {}", cli.fps).into());
    }

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(tempo) = cli.tempo {
        config.tempo = tempo;
    }
    config.validate()?;

    let mut clock = config.build_clock()?;
    let (notification_tx, mut notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    clock.set_notification_sender(notification_tx);
    let mut transport = Transport::new(clock);

    // Every listener gets its own queue, drained here as the audio thread would
    let mut outputs: Vec<(String, EventConsumer)> = Vec::new();

    if let Some(metronome_config) = &config.metronome {
        let (instrument, rx) = QueuedInstrument::with_capacity(EVENT_RINGBUFFER_CAPACITY);
        let metronome = metronome_config.build(instrument)?;
        transport.attach(Rc::new(RefCell::new(metronome)));
        outputs.push(("metronome".to_string(), rx));
    }
    for sequencer_config in &config.sequencers {
        let (instrument, rx) = QueuedInstrument::with_capacity(EVENT_RINGBUFFER_CAPACITY);
        let sequencer = sequencer_config.build(instrument)?;
        transport.attach(Rc::new(RefCell::new(sequencer)));
        outputs.push((sequencer_config.name.clone(), rx));
    }

    tracing::info!(
        tempo = %transport.tempo(),
        listeners = transport.clock().listener_count(),
        seconds = cli.seconds,
        fps = cli.fps,
        "session ready"
    );

    let frame = 1.0 / cli.fps;
    let frames = (cli.seconds * cli.fps).ceil() as u64;
    let mut scheduled = 0usize;

    transport.play(0.0);
    for i in 1..=frames {
        let now = i as f64 * frame;
        let beats = transport.update(frame, now);
        if !beats.is_empty() {
            tracing::debug!(now, ?beats, position = transport.position(), "frame");
        }

        scheduled += drain_events(&mut outputs, now);
        drain_notifications(&mut notification_rx);

        if cli.realtime {
            thread::sleep(Duration::from_secs_f64(frame));
        }
    }
    let beats = transport.position();
    transport.stop();
    scheduled += drain_events(&mut outputs, cli.seconds);

    tracing::info!(events = scheduled, beats, "session finished");
    Ok(())
}

fn drain_events(outputs: &mut [(String, EventConsumer)], now: f64) -> usize {
    let mut count = 0;
    for (name, rx) in outputs.iter_mut() {
        while let Some(event) = rx.try_pop() {
            count += 1;
            match event {
                InstrumentEvent::NoteOn {
                    timestamp,
                    pitch,
                    intensity,
                } => tracing::info!(
                    instrument = %name,
                    at = timestamp.unwrap_or(now),
                    note = %note_name(pitch),
                    intensity,
                    "note on"
                ),
                InstrumentEvent::NoteOff { timestamp, pitch } => tracing::debug!(
                    instrument = %name,
                    at = timestamp.unwrap_or(now),
                    note = %note_name(pitch),
                    "note off"
                ),
                InstrumentEvent::AllNotesOff => {
                    tracing::info!(instrument = %name, "all notes off")
                }
            }
        }
    }
    count
}

fn drain_notifications(rx: &mut NotificationConsumer) {
    while let Some(notification) = rx.try_pop() {
        let category = notification.category;
        let message = &notification.message;
        match notification.level {
            NotificationLevel::Error => tracing::error!(?category, "{message}"),
            NotificationLevel::Warning => tracing::warn!(?category, "{message}"),
            NotificationLevel::Info => tracing::info!(?category, "{message}"),
        }
    }
}
