//! Launch settings for the bell.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. a variant preset ([`Variant::Countdown`] or [`Variant::CountUp`]),
//! 2. the optional TOML file (`<config_dir>/meditation-bell/config.toml`),
//! 3. command line overrides.
//!
//! ```toml
//! variant = "count-up"
//! duration = 20
//!
//! [audio]
//! strategy = "synth"
//! tone_hz = 660.0
//! ```
//!
//! Settings are read once at startup. Durations edited in the UI are not
//! written back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::clip::DEFAULT_TAIL;
use crate::audio::synth::{DEFAULT_DECAY, DEFAULT_FREQUENCY, DEFAULT_PEAK};
use crate::audio::AudioStrategy;
use crate::timer::{Direction, DEFAULT_DURATION, MAX_DURATION, MIN_DURATION};

/// Directory name used under the platform config and cache directories.
pub const APP_DIR: &str = "meditation-bell";

const MAX_TAIL_SECS: f32 = 60.0;
const MAX_DECAY_MS: u64 = 60_000;

/// Errors found while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for these settings.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Parser error with location.
        #[source]
        source: toml::de::Error,
    },
    /// Duration outside the supported range.
    #[error("duration must be between 1 and 999 seconds, got {0}")]
    Duration(u32),
    /// Tick interval of zero.
    #[error("tick interval must be at least 1 ms")]
    TickInterval,
    /// Tone frequency that is not a positive number.
    #[error("tone frequency must be a positive number of Hz, got {0}")]
    Tone(f32),
    /// Clip tail that is negative, not a number, or longer than a minute.
    #[error("clip tail must be between 0 and 60 seconds, got {0}")]
    Tail(f32),
    /// Tone peak outside `(0, 1]`.
    #[error("tone peak must be above 0 and at most 1, got {0}")]
    Peak(f32),
    /// Tone decay of zero or longer than a minute.
    #[error("tone decay must be between 1 and 60000 ms, got {0}")]
    Decay(u64),
}

/// The two shipped configurations of the bell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Counts down from an editable duration and plays the bell clip.
    #[default]
    Countdown,
    /// Counts up to a fixed duration and plays the synthesized tone.
    CountUp,
}

/// How the bell sounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Which cue implementation to use.
    pub strategy: AudioStrategy,
    /// Clip asset. Defaults to `<config_dir>/meditation-bell/bell.m4a`.
    pub clip: Option<PathBuf>,
    /// Seconds from the end of the clip to play.
    pub tail_secs: f32,
    /// Synthesized tone pitch in Hz.
    pub tone_hz: f32,
    /// Synthesized tone peak amplitude, 0 to 1.
    pub peak: f32,
    /// Synthesized tone decay in milliseconds.
    pub decay_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            strategy: AudioStrategy::Auto,
            clip: None,
            tail_secs: DEFAULT_TAIL.as_secs_f32(),
            tone_hz: DEFAULT_FREQUENCY,
            peak: DEFAULT_PEAK,
            decay_ms: DEFAULT_DECAY.as_millis() as u64,
        }
    }
}

impl AudioSettings {
    /// The configured clip path, or the default location.
    pub fn clip_path(&self) -> Option<PathBuf> {
        self.clip.clone().or_else(default_clip_path)
    }
}

/// Everything the program needs at launch.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Cycle length in seconds.
    pub duration: u32,
    /// Counting direction.
    pub direction: Direction,
    /// Whether the duration can be edited from the UI.
    pub editable: bool,
    /// Tick interval in milliseconds.
    pub tick_ms: u64,
    /// Log file. `None` uses the default location.
    pub log_file: Option<PathBuf>,
    /// Audio cue settings.
    pub audio: AudioSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::preset(Variant::default())
    }
}

impl Settings {
    /// The settings of a shipped variant.
    pub fn preset(variant: Variant) -> Self {
        let (direction, editable, strategy) = match variant {
            Variant::Countdown => (Direction::Down, true, AudioStrategy::Clip),
            Variant::CountUp => (Direction::Up, false, AudioStrategy::Synth),
        };
        Self {
            duration: DEFAULT_DURATION,
            direction,
            editable,
            tick_ms: 1000,
            log_file: None,
            audio: AudioSettings {
                strategy,
                ..AudioSettings::default()
            },
        }
    }

    /// Loads settings from `path`, or from the default location when `path`
    /// is `None`. A missing default file yields the preset; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => Some(read_file(p)?),
            None => match default_config_path() {
                Some(p) if p.is_file() => Some(read_file(&p)?),
                _ => None,
            },
        };
        let settings = file.map(Self::from_file).unwrap_or_default();
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        let settings = Self::from_file(file);
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(file: FileConfig) -> Self {
        let mut settings = Self::preset(file.variant.unwrap_or_default());
        if let Some(d) = file.duration {
            settings.duration = d;
        }
        if let Some(d) = file.direction {
            settings.direction = d;
        }
        if let Some(e) = file.editable {
            settings.editable = e;
        }
        if let Some(t) = file.tick_ms {
            settings.tick_ms = t;
        }
        if file.log_file.is_some() {
            settings.log_file = file.log_file;
        }
        if let Some(audio) = file.audio {
            let a = &mut settings.audio;
            a.strategy = audio.strategy.unwrap_or(a.strategy);
            a.clip = audio.clip.or(a.clip.take());
            a.tail_secs = audio.tail_secs.unwrap_or(a.tail_secs);
            a.tone_hz = audio.tone_hz.unwrap_or(a.tone_hz);
            a.peak = audio.peak.unwrap_or(a.peak);
            a.decay_ms = audio.decay_ms.unwrap_or(a.decay_ms);
        }
        settings
    }

    /// Applies command line overrides and validates the result.
    pub fn apply(&mut self, overrides: Overrides) -> Result<(), ConfigError> {
        if let Some(variant) = overrides.variant {
            let keep_log = self.log_file.take();
            *self = Self::preset(variant);
            self.log_file = keep_log;
        }
        if let Some(d) = overrides.duration {
            self.duration = d;
        }
        if let Some(s) = overrides.strategy {
            self.audio.strategy = s;
        }
        if overrides.clip.is_some() {
            self.audio.clip = overrides.clip;
        }
        if let Some(hz) = overrides.tone_hz {
            self.audio.tone_hz = hz;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        if overrides.mute {
            self.audio.strategy = AudioStrategy::Silent;
        }
        self.validate()
    }

    /// Checks ranges that the rest of the program relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DURATION..=MAX_DURATION).contains(&self.duration) {
            return Err(ConfigError::Duration(self.duration));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::TickInterval);
        }
        let audio = &self.audio;
        if !(audio.tone_hz.is_finite() && audio.tone_hz > 0.0) {
            return Err(ConfigError::Tone(audio.tone_hz));
        }
        if !(0.0..=MAX_TAIL_SECS).contains(&audio.tail_secs) {
            return Err(ConfigError::Tail(audio.tail_secs));
        }
        if !(audio.peak > 0.0 && audio.peak <= 1.0) {
            return Err(ConfigError::Peak(audio.peak));
        }
        if !(1..=MAX_DECAY_MS).contains(&audio.decay_ms) {
            return Err(ConfigError::Decay(audio.decay_ms));
        }
        Ok(())
    }

    /// The log file to write to, falling back to the cache directory.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join(APP_DIR).join("bell.log")))
    }
}

/// Command line overrides. `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replace everything with a preset first.
    pub variant: Option<Variant>,
    /// Cycle length.
    pub duration: Option<u32>,
    /// Audio strategy.
    pub strategy: Option<AudioStrategy>,
    /// Clip asset.
    pub clip: Option<PathBuf>,
    /// Tone pitch.
    pub tone_hz: Option<f32>,
    /// Log file.
    pub log_file: Option<PathBuf>,
    /// Force the silent cue.
    pub mute: bool,
}

/// `<config_dir>/meditation-bell/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `<config_dir>/meditation-bell/bell.m4a`
pub fn default_clip_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("bell.m4a"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    variant: Option<Variant>,
    duration: Option<u32>,
    direction: Option<Direction>,
    editable: Option<bool>,
    tick_ms: Option<u64>,
    log_file: Option<PathBuf>,
    audio: Option<FileAudio>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileAudio {
    strategy: Option<AudioStrategy>,
    clip: Option<PathBuf>,
    tail_secs: Option<f32>,
    tone_hz: Option<f32>,
    peak: Option<f32>,
    decay_ms: Option<u64>,
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn origin() -> &'static Path {
        Path::new("test.toml")
    }

    #[test]
    fn test_presets() {
        let down = Settings::preset(Variant::Countdown);
        assert_eq!(down.duration, 15);
        assert_eq!(down.direction, Direction::Down);
        assert!(down.editable);
        assert_eq!(down.audio.strategy, AudioStrategy::Clip);

        let up = Settings::preset(Variant::CountUp);
        assert_eq!(up.duration, 15);
        assert_eq!(up.direction, Direction::Up);
        assert!(!up.editable);
        assert_eq!(up.audio.strategy, AudioStrategy::Synth);

        assert_eq!(Settings::default(), down);
    }

    #[test]
    fn test_empty_file_is_preset() {
        let settings = Settings::from_toml("", origin()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_overrides_preset() {
        let text = r#"
            variant = "count-up"
            duration = 20
            editable = true

            [audio]
            tone_hz = 660.0
        "#;
        let settings = Settings::from_toml(text, origin()).unwrap();
        assert_eq!(settings.direction, Direction::Up);
        assert_eq!(settings.duration, 20);
        assert!(settings.editable);
        assert_eq!(settings.audio.strategy, AudioStrategy::Synth);
        assert_eq!(settings.audio.tone_hz, 660.0);
        assert_eq!(settings.audio.decay_ms, 1500);
    }

    #[test]
    fn test_out_of_range_duration_rejected() {
        let err = Settings::from_toml("duration = 0", origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Duration(0)));

        let err = Settings::from_toml("duration = 1000", origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Duration(1000)));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = Settings::from_toml("tick_ms = 0", origin()).unwrap_err();
        assert!(matches!(err, ConfigError::TickInterval));
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = Settings::from_toml("volume = 3", origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "duration = 42").unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.duration, 42);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Settings::load(Some(Path::new("/no/such/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut settings = Settings::default();
        settings
            .apply(Overrides {
                duration: Some(30),
                tone_hz: Some(440.0),
                mute: true,
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(settings.duration, 30);
        assert_eq!(settings.audio.tone_hz, 440.0);
        assert_eq!(settings.audio.strategy, AudioStrategy::Silent);
    }

    #[test]
    fn test_variant_override_resets_to_preset() {
        let mut settings = Settings::from_toml("duration = 99", origin()).unwrap();
        settings.log_file = Some(PathBuf::from("/tmp/bell.log"));
        settings
            .apply(Overrides {
                variant: Some(Variant::CountUp),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(settings.duration, 15);
        assert_eq!(settings.direction, Direction::Up);
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/bell.log")));
    }

    #[test]
    fn test_out_of_range_audio_values_rejected() {
        for text in [
            "[audio]\ntail_secs = inf",
            "[audio]\ntail_secs = nan",
            "[audio]\ntail_secs = 1e30",
            "[audio]\ntail_secs = -1.0",
        ] {
            let err = Settings::from_toml(text, origin()).unwrap_err();
            assert!(matches!(err, ConfigError::Tail(_)), "{text}: {err}");
        }

        for text in ["[audio]\npeak = 0.0", "[audio]\npeak = 1.5", "[audio]\npeak = nan"] {
            let err = Settings::from_toml(text, origin()).unwrap_err();
            assert!(matches!(err, ConfigError::Peak(_)), "{text}: {err}");
        }

        for text in ["[audio]\ndecay_ms = 0", "[audio]\ndecay_ms = 600000"] {
            let err = Settings::from_toml(text, origin()).unwrap_err();
            assert!(matches!(err, ConfigError::Decay(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_audio_edge_values_accepted() {
        let text = "[audio]\ntail_secs = 0.0\npeak = 1.0\ndecay_ms = 60000";
        let settings = Settings::from_toml(text, origin()).unwrap();
        assert_eq!(settings.audio.tail_secs, 0.0);
        assert_eq!(settings.audio.peak, 1.0);
    }

    #[test]
    fn test_override_validation() {
        let mut settings = Settings::default();
        let err = settings
            .apply(Overrides {
                tone_hz: Some(-1.0),
                ..Overrides::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::Tone(_)));
    }
}
