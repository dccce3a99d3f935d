//! The looping interval timer that drives the bell.
//!
//! A [`Model`] counts one unit per tick toward a cycle boundary. At the
//! boundary it rings its [`AudioCue`] and restarts the cycle in the same
//! tick, staying in [`RunState::Running`]. It never stops by itself.
//!
//! Two directions are supported:
//!
//! - [`Direction::Down`] shows `duration, duration-1, ..., 1` and rings when
//!   a tick arrives on `1`.
//! - [`Direction::Up`] shows `0, 1, ..., duration-1` and rings when a tick
//!   arrives on `duration-1`.
//!
//! # Tick loop
//!
//! Ticks are `bubbletea-rs` tick commands carrying the timer's `id` and a
//! generation `tag`. [`Model::start`] bumps the tag and schedules a fresh
//! tick; [`Model::pause`], [`Model::reset`] and [`Model::shutdown`] bump it
//! too, so a tick that was already in flight is dropped when it arrives.
//! There is therefore at most one live tick chain.
//!
//! ```rust
//! use std::sync::Arc;
//! use meditation_bell::audio::SilentCue;
//! use meditation_bell::timer::{new, Direction, RunState};
//!
//! let mut timer = new(15, Direction::Down, Arc::new(SilentCue));
//! assert_eq!(timer.view(), "15");
//!
//! let _first_tick = timer.start();
//! assert_eq!(timer.run_state(), RunState::Running);
//!
//! for _ in 0..14 {
//!     timer.advance();
//! }
//! assert_eq!(timer.remaining(), 1);
//! assert!(timer.advance()); // rings and restarts
//! assert_eq!(timer.remaining(), 15);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::audio::AudioCue;
use crate::config::Settings;

/// Cycle length used when nothing else is configured or input is unusable.
pub const DEFAULT_DURATION: u32 = 15;
/// Shortest cycle.
pub const MIN_DURATION: u32 = 1;
/// Longest cycle; three digits.
pub const MAX_DURATION: u32 = 999;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Clamps a duration into `[MIN_DURATION, MAX_DURATION]`.
pub fn clamp_duration(secs: u32) -> u32 {
    secs.clamp(MIN_DURATION, MAX_DURATION)
}

/// Which way the display counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// From the duration down to 1.
    #[default]
    Down,
    /// From 0 up to duration - 1.
    Up,
}

/// Whether the tick loop is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No tick pending.
    #[default]
    Stopped,
    /// Exactly one tick pending.
    Running,
}

/// Rejected duration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The duration only changes while stopped.
    #[error("the duration cannot change while the timer is running")]
    Running,
    /// The timer was built with a fixed duration.
    #[error("this timer has a fixed duration")]
    Fixed,
}

/// Sent once per interval while the timer runs.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// The timer that scheduled this tick.
    pub id: i64,
    tag: i64,
}

/// Looping countdown (or count-up) state.
#[derive(Clone)]
pub struct Model {
    duration: u32,
    remaining: u32,
    direction: Direction,
    editable: bool,
    interval: Duration,
    state: RunState,
    id: i64,
    tag: i64,
    cycles: u64,
    cue: Arc<dyn AudioCue>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("direction", &self.direction)
            .field("editable", &self.editable)
            .field("interval", &self.interval)
            .field("state", &self.state)
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("cycles", &self.cycles)
            .field("cue", &self.cue.name())
            .finish()
    }
}

/// Creates a stopped, editable timer with a one second interval.
///
/// `duration` is clamped to `[1, 999]`. The cue's
/// [`prepare_playback`](AudioCue::prepare_playback) runs here, once.
pub fn new(duration: u32, direction: Direction, cue: Arc<dyn AudioCue>) -> Model {
    let duration = clamp_duration(duration);
    let mut timer = Model {
        duration,
        remaining: 0,
        direction,
        editable: true,
        interval: Duration::from_secs(1),
        state: RunState::Stopped,
        id: next_id(),
        tag: 0,
        cycles: 0,
        cue,
    };
    timer.remaining = timer.start_value();
    timer.cue.prepare_playback();
    timer
}

/// Creates a timer from launch settings.
pub fn from_settings(settings: &Settings, cue: Arc<dyn AudioCue>) -> Model {
    new(settings.duration, settings.direction, cue)
        .with_interval(Duration::from_millis(settings.tick_ms.max(1)))
        .with_editable(settings.editable)
}

impl Model {
    /// Sets the tick interval. Nominally one second.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Allows or forbids [`Model::set_duration`].
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Unique id of this timer; ticks from other timers are ignored.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Seconds shown on the display.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Cycle length in seconds.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Counting direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the duration can be changed.
    pub fn editable(&self) -> bool {
        self.editable
    }

    /// Tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current run state.
    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Shorthand for `run_state() == RunState::Running`.
    pub fn running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Boundaries crossed since creation.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Name of the cue this timer rings.
    pub fn cue_name(&self) -> &'static str {
        self.cue.name()
    }

    /// The value a fresh cycle starts from.
    pub fn start_value(&self) -> u32 {
        match self.direction {
            Direction::Down => self.duration,
            Direction::Up => 0,
        }
    }

    /// Fraction of the cycle shown by the progress bar, in `[0, 1]`.
    ///
    /// Counting down this is the elapsed share, counting up the displayed
    /// value over the duration.
    pub fn progress(&self) -> f64 {
        let d = f64::from(self.duration);
        match self.direction {
            Direction::Down => f64::from(self.duration - self.remaining) / d,
            Direction::Up => f64::from(self.remaining) / d,
        }
    }

    /// Starts the tick loop. No-op while running.
    ///
    /// Every start asks the cue to unlock its audio output, so a failed
    /// unlock is retried on the next start. Cues ignore the request once
    /// they are unlocked.
    pub fn start(&mut self) -> Option<Cmd> {
        if self.running() {
            return None;
        }
        self.cue.unlock_playback();
        self.state = RunState::Running;
        self.tag += 1;
        debug!(id = self.id, remaining = self.remaining, "timer started");
        Some(self.tick())
    }

    /// Stops the tick loop, keeping the displayed value.
    pub fn pause(&mut self) {
        if !self.running() {
            return;
        }
        self.state = RunState::Stopped;
        self.tag += 1;
        debug!(id = self.id, remaining = self.remaining, "timer paused");
    }

    /// Starts when stopped, pauses when running.
    pub fn toggle(&mut self) -> Option<Cmd> {
        if self.running() {
            self.pause();
            None
        } else {
            self.start()
        }
    }

    /// Stops and rewinds to the start value.
    pub fn reset(&mut self) {
        self.state = RunState::Stopped;
        self.tag += 1;
        self.remaining = self.start_value();
        debug!(id = self.id, "timer reset");
    }

    /// Changes the cycle length and rewinds. Only while stopped.
    ///
    /// The value is clamped to `[1, 999]`; the clamped value is returned.
    pub fn set_duration(&mut self, secs: u32) -> Result<u32, TimerError> {
        if !self.editable {
            return Err(TimerError::Fixed);
        }
        if self.running() {
            return Err(TimerError::Running);
        }
        self.duration = clamp_duration(secs);
        self.remaining = self.start_value();
        info!(duration = self.duration, "cycle duration set");
        Ok(self.duration)
    }

    /// Advances one unit, ringing the cue on a boundary.
    ///
    /// The boundary check happens before the move, so the display never
    /// leaves `[0, duration]` and the cue rings once per boundary. Returns
    /// whether this tick crossed a boundary.
    pub fn advance(&mut self) -> bool {
        let boundary = match self.direction {
            Direction::Down => self.remaining <= 1,
            Direction::Up => self.remaining + 1 >= self.duration,
        };

        if boundary {
            self.cycles += 1;
            info!(cycle = self.cycles, cue = self.cue.name(), "cycle complete");
            self.cue.play_cue();
            self.remaining = self.start_value();
        } else {
            match self.direction {
                Direction::Down => self.remaining -= 1,
                Direction::Up => self.remaining += 1,
            }
        }
        boundary
    }

    /// Stops for good; any pending tick is dropped on arrival.
    pub fn shutdown(&mut self) {
        self.state = RunState::Stopped;
        self.tag += 1;
        debug!(id = self.id, cycles = self.cycles, "timer shut down");
    }

    fn tick(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;
        bubbletea_tick(self.interval, move |_| Box::new(TickMsg { id, tag }) as Msg)
    }

    /// Handles this timer's [`TickMsg`]s and schedules the next one.
    ///
    /// Ticks for other timers, stale ticks from before the last
    /// start/pause/reset, and ticks while stopped are ignored.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let tick = msg.downcast_ref::<TickMsg>()?;
        if tick.id != self.id || tick.tag != self.tag || !self.running() {
            return None;
        }
        self.advance();
        Some(self.tick())
    }

    /// Remaining seconds, zero padded to two digits.
    pub fn view(&self) -> String {
        format!("{:02}", self.remaining)
    }
}
