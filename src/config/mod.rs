// Session configuration - tempo, clock settings, metronome and sequencers
// Stored as RON (default) or JSON, picked by file extension

use crate::instrument::Instrument;
use crate::sequencer::{
    ClockSettings, Metronome, Note, Pattern, PatternWindow, Pitch, Sequencer, Tempo,
    TransportClock, TransportError, TransportResult,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported config format: {0} (expected .ron or .json)")]
    UnsupportedFormat(String),

    #[error("Invalid session: {0}")]
    Invalid(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON syntax error: {0}")]
    RonSyntax(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Ron,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Ok(ConfigFormat::Ron),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Whole session: one clock, an optional metronome and any number of sequencers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Initial tempo in BPM
    pub tempo: f64,
    pub clock: ClockSettings,
    pub metronome: Option<MetronomeConfig>,
    pub sequencers: Vec<SequencerConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tempo: Tempo::DEFAULT_BPM,
            clock: ClockSettings::default(),
            metronome: Some(MetronomeConfig::default()),
            sequencers: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn from_ron_str(source: &str) -> ConfigResult<Self> {
        Ok(ron::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_ron_string(&self) -> ConfigResult<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a session file (.ron or .json)
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let source = fs::read_to_string(path)?;

        let config = match format {
            ConfigFormat::Ron => Self::from_ron_str(&source)?,
            ConfigFormat::Json => Self::from_json_str(&source)?,
        };
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            tempo = config.tempo,
            sequencers = config.sequencers.len(),
            "session loaded"
        );
        Ok(config)
    }

    /// Save a session file, format picked by extension
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Ron => self.to_ron_string()?,
            ConfigFormat::Json => self.to_json_string()?,
        };
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check every value without building anything
    pub fn validate(&self) -> TransportResult<()> {
        Tempo::new(self.tempo)?;
        self.clock.validate()?;
        if let Some(metronome) = &self.metronome {
            metronome.validate()?;
        }
        for sequencer in &self.sequencers {
            sequencer.pattern.build()?;
        }
        Ok(())
    }

    /// Build the session clock at the configured tempo
    pub fn build_clock(&self) -> ConfigResult<TransportClock> {
        let mut clock = TransportClock::new(self.clock)?;
        clock.set_tempo(self.tempo)?;
        Ok(clock)
    }
}

/// Metronome settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub beats_per_bar: u32,
    pub bar_pitch: Pitch,
    pub beat_pitch: Pitch,
    pub intensity: f64,
    pub ticking: bool,
    pub logging: bool,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            beats_per_bar: 4,
            bar_pitch: 72,
            beat_pitch: 60,
            intensity: 1.0,
            ticking: true,
            logging: false,
        }
    }
}

impl MetronomeConfig {
    pub fn validate(&self) -> TransportResult<()> {
        if self.beats_per_bar == 0 {
            return Err(TransportError::InvalidBeatsPerBar);
        }
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(TransportError::InvalidIntensity(self.intensity));
        }
        Ok(())
    }

    pub fn build<I: Instrument>(&self, instrument: I) -> TransportResult<Metronome<I>> {
        self.validate()?;
        let mut metronome = Metronome::new(instrument);
        metronome.set_beats_per_bar(self.beats_per_bar)?;
        metronome.set_pitches(self.bar_pitch, self.beat_pitch);
        metronome.set_intensity(self.intensity);
        metronome.set_ticking(self.ticking);
        metronome.set_logging(self.logging);
        Ok(metronome)
    }
}

/// One sequencer and its pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub name: String,
    pub root_pitch: Pitch,
    pub pattern: PatternConfig,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            name: "Sequencer".to_string(),
            root_pitch: 60,
            pattern: PatternConfig::default(),
        }
    }
}

impl SequencerConfig {
    pub fn build<I: Instrument>(&self, instrument: I) -> TransportResult<Sequencer<I>> {
        let mut sequencer = Sequencer::with_pattern(instrument, self.pattern.build()?);
        sequencer.set_root_pitch(self.root_pitch);
        Ok(sequencer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Absolute start in beats
    pub start: f64,
    pub length_beats: u32,
    pub looping: bool,
    pub notes: Vec<NoteConfig>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            length_beats: 4,
            looping: true,
            notes: Vec::new(),
        }
    }
}

impl PatternConfig {
    pub fn build(&self) -> TransportResult<Pattern> {
        let window = PatternWindow::new(self.start, self.length_beats, self.looping)?;
        let notes = self
            .notes
            .iter()
            .map(NoteConfig::build)
            .collect::<TransportResult<Vec<_>>>()?;
        Ok(Pattern::with_notes(window, notes))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteConfig {
    /// Beats from the pattern start
    pub position: f64,
    pub duration: f64,
    /// Semitones from the sequencer root
    pub pitch_offset: i32,
    pub intensity: f64,
    pub muted: bool,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            position: 0.0,
            duration: 1.0,
            pitch_offset: 0,
            intensity: 1.0,
            muted: false,
        }
    }
}

impl NoteConfig {
    pub fn build(&self) -> TransportResult<Note> {
        Ok(Note::new(self.position, self.duration, self.pitch_offset, self.intensity)?
            .with_muted(self.muted))
    }
}
