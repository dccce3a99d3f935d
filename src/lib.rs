#![warn(missing_docs)]

//! # meditation-bell
//!
//! A looping interval timer for the terminal, built on
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs). A big number counts
//! through a cycle; at the end of every cycle a bell rings and the next cycle
//! starts on its own. Play, pause, reset and an editable duration are the
//! only controls.
//!
//! ## Components
//!
//! Each component follows the Elm Architecture with `update()` and `view()`:
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | `Timer` | [`timer`] | Run state, remaining seconds, tick loop, cue at the boundary |
//! | `DurationEditor` | [`editor`] | Digit-only inline editing of the cycle length |
//! | `Progress` | [`progress`] | Animated cycle progress bar |
//! | `App` | [`app`] | The screen composing the above |
//!
//! The sound is an [`audio::AudioCue`]: a recorded clip, a synthesized tone,
//! or nothing, chosen once at startup.
//!
//! ## Driving the timer directly
//!
//! ```rust
//! use std::sync::Arc;
//! use meditation_bell::prelude::*;
//!
//! let mut timer = timer_new(3, Direction::Down, Arc::new(SilentCue));
//! let _tick = timer.start();
//! timer.advance();
//! timer.advance();
//! assert_eq!(timer.remaining(), 1);
//! assert!(timer.advance()); // bell, and back to 3
//! assert_eq!(timer.remaining(), 3);
//! assert!(timer.running());
//! ```
//!
//! ## Editing the duration
//!
//! ```rust
//! use meditation_bell::prelude::*;
//!
//! let mut editor = editor_new();
//! assert!(editor.begin(15, RunState::Stopped));
//! editor.set_input("42");
//! assert_eq!(editor.commit(), Some(42));
//! assert!(!editor.editing());
//! ```

pub mod app;
pub mod audio;
pub mod config;
pub mod editor;
pub mod key;
pub mod logging;
pub mod progress;
pub mod timer;

pub use app::App;
pub use audio::{AudioCue, AudioStrategy, ClipCue, SilentCue, SynthCue};
pub use config::{Settings, Variant};
pub use editor::Model as DurationEditor;
pub use progress::Model as Progress;
pub use timer::{Direction, Model as Timer, RunState, TimerError};

/// Everything needed to embed the bell's components.
pub mod prelude {
    pub use crate::app::App;
    pub use crate::audio::{AudioCue, AudioStrategy, ClipCue, SilentCue, SynthCue};
    pub use crate::config::{Settings, Variant};
    pub use crate::editor::{
        new as editor_new, parse_duration, EditState, EditorEvent, Model as DurationEditor,
    };
    pub use crate::key::{new_binding, with_help, with_keys_str, Binding, KeyMap};
    pub use crate::progress::{new as progress_new, Model as Progress};
    pub use crate::timer::{
        new as timer_new, Direction, Model as Timer, RunState, TickMsg as TimerTickMsg,
        TimerError,
    };
}
