//! Bell cue backed by a recorded clip.
//!
//! The clip is read into memory once by [`AudioCue::prepare_playback`] and
//! its length measured by decoding it. Each cue decodes the in-memory copy
//! and plays only its final `tail` (two seconds by default), which is where
//! the bell rings out in the recordings this was made for.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::source::Zero;
use rodio::{Decoder, Source};
use tracing::{debug, info, warn};

use super::output::{BoxedSource, Output};
use super::{AudioCue, AudioError};

/// Default length of the clip tail played at each boundary.
pub const DEFAULT_TAIL: Duration = Duration::from_secs(2);

#[derive(Clone)]
struct Clip {
    bytes: Arc<[u8]>,
    length: Duration,
}

/// Plays the tail of an audio file.
pub struct ClipCue {
    path: PathBuf,
    tail: Duration,
    clip: Mutex<Option<Clip>>,
    unlocked: AtomicBool,
    output: Output,
}

impl ClipCue {
    /// Creates a cue for the file at `path`. Nothing is read until
    /// [`AudioCue::prepare_playback`] or [`ClipCue::load`].
    pub fn new(path: impl Into<PathBuf>, tail: Duration) -> Self {
        Self {
            path: path.into(),
            tail,
            clip: Mutex::new(None),
            unlocked: AtomicBool::new(false),
            output: Output::new("clip"),
        }
    }

    /// Path of the clip asset.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the loaded clip, if it has been loaded.
    pub fn length(&self) -> Option<Duration> {
        self.clip.lock().as_ref().map(|c| c.length)
    }

    /// Whether the unlock step has completed.
    pub fn unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    /// Reads and measures the clip, replacing any previously loaded copy.
    pub fn load(&self) -> Result<Duration, AudioError> {
        let bytes: Arc<[u8]> = fs::read(&self.path)
            .map_err(|source| AudioError::Io {
                path: self.path.clone(),
                source,
            })?
            .into();
        let length = measure(&bytes)?;
        *self.clip.lock() = Some(Clip { bytes, length });
        Ok(length)
    }

    fn try_unlock(&self) -> Result<(), AudioError> {
        let source: BoxedSource = match self.clip.lock().clone() {
            Some(clip) => Box::new(decode(&clip)?),
            None => Box::new(Zero::<f32>::new(1, 44_100).take_duration(Duration::from_millis(10))),
        };
        self.output.prime(source)
    }

    fn try_play(&self) -> Result<(), AudioError> {
        let clip = self.clip.lock().clone().ok_or(AudioError::NotLoaded)?;
        if clip.length.is_zero() {
            debug!("clip has no measurable length, skipping cue");
            return Ok(());
        }
        let offset = tail_offset(clip.length, self.tail);
        let source = decode(&clip)?.skip_duration(offset);
        self.output.play(Box::new(source))
    }
}

impl AudioCue for ClipCue {
    fn name(&self) -> &'static str {
        "clip"
    }

    fn prepare_playback(&self) {
        match self.load() {
            Ok(length) => info!(path = %self.path.display(), ?length, "bell clip loaded"),
            Err(err) => warn!(error = %err, "bell clip unavailable, boundaries will be silent"),
        }
    }

    fn unlock_playback(&self) {
        if self.unlocked() {
            return;
        }
        match self.try_unlock() {
            Ok(()) => {
                self.unlocked.store(true, Ordering::SeqCst);
                debug!("audio output unlocked");
            }
            Err(err) => warn!(error = %err, "audio unlock failed"),
        }
    }

    fn play_cue(&self) {
        if let Err(err) = self.try_play() {
            warn!(error = %err, "bell clip playback failed");
        }
    }
}

/// Where playback starts so that only the last `tail` of the clip is heard.
pub(crate) fn tail_offset(length: Duration, tail: Duration) -> Duration {
    length.saturating_sub(tail)
}

fn decode(clip: &Clip) -> Result<impl Source<Item = f32> + Send, AudioError> {
    let decoder = Decoder::new(Cursor::new(Arc::clone(&clip.bytes)))?;
    Ok(decoder.convert_samples::<f32>())
}

fn measure(bytes: &Arc<[u8]>) -> Result<Duration, AudioError> {
    let decoder = Decoder::new(Cursor::new(Arc::clone(bytes)))?;
    if let Some(total) = decoder.total_duration() {
        return Ok(total);
    }

    let channels = u64::from(decoder.channels().max(1));
    let rate = u64::from(decoder.sample_rate().max(1));
    let samples = decoder.count() as u64;
    Ok(Duration::from_secs_f64(
        samples as f64 / (channels * rate) as f64,
    ))
}
