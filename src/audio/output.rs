//! The playback thread shared by the cue implementations.
//!
//! `rodio::OutputStream` cannot leave the thread that opened it, so each cue
//! owns one worker thread that opens the device lazily and receives sources
//! over a channel. Sending never blocks the caller.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use parking_lot::Mutex;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::AudioError;

/// A source the worker can play.
pub(crate) type BoxedSource = Box<dyn Source<Item = f32> + Send>;

enum Command {
    /// Muted play, pause and stop: acquires the device without sound.
    Prime(BoxedSource),
    /// Plays the source to completion in the background.
    Play(BoxedSource),
}

/// Handle to a lazily spawned playback thread.
pub(crate) struct Output {
    label: &'static str,
    tx: Mutex<Option<Sender<Command>>>,
}

impl Output {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            tx: Mutex::new(None),
        }
    }

    /// Opens the device with a silent run of `source`.
    pub(crate) fn prime(&self, source: BoxedSource) -> Result<(), AudioError> {
        self.send(Command::Prime(source))
    }

    /// Queues `source` for playback.
    pub(crate) fn play(&self, source: BoxedSource) -> Result<(), AudioError> {
        self.send(Command::Play(source))
    }

    fn send(&self, cmd: Command) -> Result<(), AudioError> {
        let mut guard = self.tx.lock();
        let tx = guard.get_or_insert_with(|| spawn(self.label));
        if tx.send(cmd).is_err() {
            // The worker exited (usually no device). Respawn on the next cue.
            *guard = None;
            return Err(AudioError::WorkerGone);
        }
        Ok(())
    }
}

fn spawn(label: &'static str) -> Sender<Command> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name(format!("bell-audio-{label}"))
        .spawn(move || run(label, rx));
    if let Err(err) = spawned {
        warn!(cue = label, error = %err, "failed to spawn audio thread");
    }
    tx
}

fn run(label: &'static str, rx: Receiver<Command>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(err) => {
            warn!(cue = label, error = %AudioError::from(err), "audio output unavailable");
            return;
        }
    };
    debug!(cue = label, "audio output opened");

    for cmd in rx {
        if let Err(err) = execute(&handle, cmd) {
            warn!(cue = label, error = %err, "audio playback failed");
        }
    }
    debug!(cue = label, "audio thread exiting");
}

fn execute(handle: &OutputStreamHandle, cmd: Command) -> Result<(), AudioError> {
    let sink = Sink::try_new(handle)?;
    match cmd {
        Command::Prime(source) => {
            sink.set_volume(0.0);
            sink.append(source);
            sink.pause();
            sink.stop();
        }
        Command::Play(source) => {
            sink.append(source);
            sink.detach();
        }
    }
    Ok(())
}
