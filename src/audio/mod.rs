//! Audio cues played at every cycle boundary.
//!
//! The timer only ever talks to an [`AudioCue`]. Which implementation backs
//! it is decided once, when the program is composed, by [`build`]:
//!
//! - [`ClipCue`] plays the tail of a recorded bell clip.
//! - [`SynthCue`] synthesizes a decaying sine tone.
//! - [`SilentCue`] only logs the boundary.
//!
//! Playback is fire-and-forget. Every failure (no output device, missing
//! asset, undecodable file) is logged and swallowed so that a broken sound
//! setup degrades to a silent boundary and never disturbs the timer.

pub mod clip;
mod output;
pub mod synth;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::AudioSettings;

pub use clip::ClipCue;
pub use synth::{BellTone, SynthCue};

/// Errors raised inside cue implementations.
///
/// They never reach the timer: implementations log them at `warn`.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The clip asset could not be read.
    #[error("failed to read clip {path}: {source}")]
    Io {
        /// Path of the asset.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The clip could not be decoded.
    #[error("failed to decode clip: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    /// No output device could be opened.
    #[error("no audio output device: {0}")]
    Device(#[from] rodio::StreamError),
    /// A sink could not be created on the output device.
    #[error("failed to open playback sink: {0}")]
    Stream(#[from] rodio::PlayError),
    /// The playback thread is no longer running.
    #[error("audio playback worker has stopped")]
    WorkerGone,
    /// A cue was requested before the clip was loaded.
    #[error("clip is not loaded")]
    NotLoaded,
}

/// The sound-producing collaborator the timer invokes at a cycle boundary.
///
/// None of the methods block or report errors to the caller. The first two
/// are optional and idempotent.
pub trait AudioCue: Send + Sync {
    /// Short name used in logs and the status line.
    fn name(&self) -> &'static str;

    /// Called once when the timer is created, to preload assets.
    fn prepare_playback(&self) {}

    /// Called on every user-initiated start, to acquire the output device
    /// before the first real cue. Does nothing once unlocked, and retries
    /// if an earlier attempt failed.
    fn unlock_playback(&self) {}

    /// Plays the bell. Called exactly once per cycle boundary.
    fn play_cue(&self);
}

/// Which cue implementation to compose the program with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AudioStrategy {
    /// The clip when its file exists, otherwise the synthesized tone.
    #[default]
    Auto,
    /// Recorded clip.
    Clip,
    /// Synthesized tone.
    Synth,
    /// No sound.
    Silent,
}

impl AudioStrategy {
    /// Resolves `Auto` into a concrete strategy.
    pub fn resolve(self, clip_available: bool) -> Self {
        match self {
            AudioStrategy::Auto if clip_available => AudioStrategy::Clip,
            AudioStrategy::Auto => AudioStrategy::Synth,
            other => other,
        }
    }
}

/// A cue that makes no sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn play_cue(&self) {
        debug!("cycle boundary (silent cue)");
    }
}

/// Builds the cue described by the audio settings.
pub fn build(settings: &AudioSettings) -> Arc<dyn AudioCue> {
    let clip_path = settings.clip_path();
    let clip_available = clip_path.as_ref().is_some_and(|p| p.is_file());
    let strategy = settings.strategy.resolve(clip_available);

    let cue: Arc<dyn AudioCue> = match (strategy, clip_path) {
        (AudioStrategy::Clip, Some(path)) => {
            let tail =
                Duration::try_from_secs_f32(settings.tail_secs).unwrap_or(clip::DEFAULT_TAIL);
            Arc::new(ClipCue::new(path, tail))
        }
        (AudioStrategy::Clip, None) | (AudioStrategy::Silent, _) => Arc::new(SilentCue),
        (AudioStrategy::Synth, _) | (AudioStrategy::Auto, _) => Arc::new(SynthCue::new(
            settings.tone_hz,
            settings.peak,
            Duration::from_millis(settings.decay_ms),
        )),
    };

    info!(cue = cue.name(), "audio cue selected");
    cue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_clip_when_available() {
        assert_eq!(AudioStrategy::Auto.resolve(true), AudioStrategy::Clip);
        assert_eq!(AudioStrategy::Auto.resolve(false), AudioStrategy::Synth);
    }

    #[test]
    fn test_explicit_strategy_is_kept() {
        assert_eq!(AudioStrategy::Clip.resolve(false), AudioStrategy::Clip);
        assert_eq!(AudioStrategy::Silent.resolve(true), AudioStrategy::Silent);
        assert_eq!(AudioStrategy::Synth.resolve(true), AudioStrategy::Synth);
    }

    #[test]
    fn test_build_selects_implementation() {
        let mut settings = AudioSettings {
            strategy: AudioStrategy::Silent,
            ..AudioSettings::default()
        };
        assert_eq!(build(&settings).name(), "silent");

        settings.strategy = AudioStrategy::Synth;
        assert_eq!(build(&settings).name(), "synth");

        settings.strategy = AudioStrategy::Auto;
        settings.clip = Some(PathBuf::from("/definitely/not/here.m4a"));
        assert_eq!(build(&settings).name(), "synth");
    }

    #[test]
    fn test_clip_strategy_with_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = AudioSettings {
            strategy: AudioStrategy::Clip,
            clip: Some(file.path().to_path_buf()),
            ..AudioSettings::default()
        };
        assert_eq!(build(&settings).name(), "clip");
    }

    #[test]
    fn test_unusable_tail_falls_back_to_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        for tail_secs in [f32::INFINITY, f32::NAN, -1.0, 1e30] {
            let settings = AudioSettings {
                strategy: AudioStrategy::Clip,
                clip: Some(file.path().to_path_buf()),
                tail_secs,
                ..AudioSettings::default()
            };
            assert_eq!(build(&settings).name(), "clip");
        }
    }

    #[test]
    fn test_silent_cue_is_inert() {
        let cue = SilentCue;
        cue.prepare_playback();
        cue.unlock_playback();
        cue.play_cue();
        assert_eq!(cue.name(), "silent");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::AudioCue;

    /// Counts every call it receives.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingCue {
        prepared: AtomicUsize,
        unlocked: AtomicUsize,
        played: AtomicUsize,
    }

    impl RecordingCue {
        pub(crate) fn prepares(&self) -> usize {
            self.prepared.load(Ordering::SeqCst)
        }

        pub(crate) fn unlocks(&self) -> usize {
            self.unlocked.load(Ordering::SeqCst)
        }

        pub(crate) fn plays(&self) -> usize {
            self.played.load(Ordering::SeqCst)
        }
    }

    impl AudioCue for RecordingCue {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn prepare_playback(&self) {
            self.prepared.fetch_add(1, Ordering::SeqCst);
        }

        fn unlock_playback(&self) {
            self.unlocked.fetch_add(1, Ordering::SeqCst);
        }

        fn play_cue(&self) {
            self.played.fetch_add(1, Ordering::SeqCst);
        }
    }
}
