//! The bell screen: one timer, its duration editor and a progress bar.
//!
//! [`App`] is the `bubbletea-rs` program model. It routes key presses to the
//! timer controls or, while editing, to the editor; forwards ticks to the
//! timer; and keeps the progress bar in step with the timer after every
//! change.
//!
//! `bubbletea-rs` builds the model through the parameterless
//! [`Model::init`](bubbletea_rs::Model::init), so launch parameters are handed
//! over with [`launch`] before the program starts:
//!
//! ```rust,ignore
//! use meditation_bell::{app, audio, config::Settings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let cue = audio::build(&settings.audio);
//! app::launch(settings, cue);
//!
//! let program = bubbletea_rs::Program::<app::App>::builder()
//!     .alt_screen(true)
//!     .build()?;
//! program.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod keys;
pub mod view;

use std::sync::{Arc, OnceLock};

use bubbletea_rs::{batch, quit, Cmd, KeyMsg, Model as BubbleTeaModel, Msg, WindowSizeMsg};
use lipgloss_extras::lipgloss::{Color, Style};
use tracing::{info, warn};

use crate::audio::{AudioCue, SilentCue};
use crate::config::Settings;
use crate::editor::{self, EditorEvent};
use crate::key::KeyMap;
use crate::progress::{self, with_width, without_percentage};
use crate::timer::{self, Direction, TickMsg};

pub use keys::AppKeyMap;

const MIN_BAR: i32 = 10;
const MAX_BAR: i32 = 48;

struct Launch {
    settings: Settings,
    cue: Arc<dyn AudioCue>,
}

static LAUNCH: OnceLock<Launch> = OnceLock::new();

/// Hands the settings and cue to the next [`App::init`].
///
/// Only the first call takes effect; returns `false` for later calls.
pub fn launch(settings: Settings, cue: Arc<dyn AudioCue>) -> bool {
    LAUNCH.set(Launch { settings, cue }).is_ok()
}

/// The bell program model.
#[derive(Debug)]
pub struct App {
    timer: timer::Model,
    editor: editor::Model,
    progress: progress::Model,
    keys: AppKeyMap,
    width: usize,
    height: usize,
}

impl App {
    /// Builds the screen for `settings`, ringing `cue` at each boundary.
    pub fn new(settings: &Settings, cue: Arc<dyn AudioCue>) -> Self {
        let mut app = Self {
            timer: timer::from_settings(settings, cue),
            editor: editor::new(),
            progress: progress::new(&[with_width(40), without_percentage()]),
            keys: AppKeyMap::default(),
            width: 0,
            height: 0,
        };
        app.sync_keys();
        app
    }

    /// The timer controller.
    pub fn timer(&self) -> &timer::Model {
        &self.timer
    }

    /// The duration editor.
    pub fn editor(&self) -> &editor::Model {
        &self.editor
    }

    /// The key bindings, with their current enabled state.
    pub fn keys(&self) -> &AppKeyMap {
        &self.keys
    }

    fn dispatch(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(key) = msg.downcast_ref::<KeyMsg>() {
            return self.handle_key(key);
        }
        if let Some(size) = msg.downcast_ref::<WindowSizeMsg>() {
            self.resize(size.width as usize, size.height as usize);
            return None;
        }
        if msg.downcast_ref::<TickMsg>().is_some() {
            let next = self.timer.update(msg);
            return self.with_progress(next);
        }
        self.progress.update(msg)
    }

    fn handle_key(&mut self, key: &KeyMsg) -> Option<Cmd> {
        if self.keys.force_quit.matches(key) {
            return self.quit();
        }

        if self.editor.editing() {
            if let EditorEvent::Committed(secs) = self.editor.update(key) {
                self.commit_duration(secs);
                return self.with_progress(None);
            }
            return None;
        }

        if self.keys.quit.matches(key) {
            return self.quit();
        }
        if self.keys.play.matches(key) {
            let first_tick = self.timer.start();
            return self.with_progress(first_tick);
        }
        if self.keys.pause.matches(key) {
            self.timer.pause();
            return None;
        }
        if self.keys.toggle.matches(key) {
            let first_tick = self.timer.toggle();
            return self.with_progress(first_tick);
        }
        if self.keys.reset.matches(key) {
            self.timer.reset();
            return self.with_progress(None);
        }
        if self.keys.edit.matches(key) {
            self.editor.begin(self.edit_seed(), self.timer.run_state());
        }
        None
    }

    /// Counting down the display shows what is left of the cycle; counting
    /// up it shows elapsed time, so the cycle length is offered instead.
    fn edit_seed(&self) -> u32 {
        match self.timer.direction() {
            Direction::Down => self.timer.remaining(),
            Direction::Up => self.timer.duration(),
        }
    }

    /// Takes focus away from the duration editor, committing its buffer to
    /// the timer. Does nothing when not editing.
    pub fn blur_editor(&mut self) -> Option<Cmd> {
        let secs = self.editor.commit()?;
        self.commit_duration(secs);
        self.sync_keys();
        self.with_progress(None)
    }

    fn commit_duration(&mut self, secs: u32) {
        match self.timer.set_duration(secs) {
            Ok(duration) => info!(duration, "duration committed"),
            Err(err) => warn!(error = %err, requested = secs, "duration unchanged"),
        }
    }

    fn quit(&mut self) -> Option<Cmd> {
        self.timer.shutdown();
        info!(cycles = self.timer.cycles(), "quitting");
        Some(quit())
    }

    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let bar = i32::try_from(width).unwrap_or(i32::MAX).saturating_sub(8);
        self.progress.width = bar.clamp(MIN_BAR, MAX_BAR);
    }

    /// Moves the bar to the timer's fraction and merges its frame command.
    fn with_progress(&mut self, cmd: Option<Cmd>) -> Option<Cmd> {
        let frame = self.progress.set_percent(self.timer.progress());
        match (cmd, frame) {
            (Some(a), Some(b)) => Some(batch(vec![a, b])),
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Greys out controls that would do nothing, like disabled buttons.
    fn sync_keys(&mut self) {
        let running = self.timer.running();
        self.keys.play.set_enabled(!running);
        self.keys.pause.set_enabled(running);
        self.keys
            .edit
            .set_enabled(!running && self.timer.editable());
    }

    fn render(&self) -> String {
        let amber = Style::new().foreground(Color::from(progress::FILL_COLOR)).bold(true);
        let label = Style::new().foreground(Color::from(view::STONE_500));

        let (number, caption, help) = if self.editor.editing() {
            (
                self.editor.value().to_string(),
                format!("new duration: {}", self.editor.view()),
                view::help_line(&self.editor.keymap.short_help()),
            )
        } else {
            (
                self.timer.view(),
                "SECONDS".to_string(),
                view::help_line(&self.keys.short_help()),
            )
        };

        let mut lines: Vec<String> = view::big_digits(&number)
            .iter()
            .map(|row| amber.render(row))
            .collect();
        lines.push(String::new());
        lines.push(label.render(&caption));
        lines.push(String::new());
        lines.push(self.progress.view());
        lines.push(String::new());
        lines.push(help);
        lines.push(label.render(&format!(
            "cycle {} · {}",
            self.timer.cycles(),
            self.timer.cue_name()
        )));

        let width = if self.width == 0 { 60 } else { self.width };
        let top = self.height.saturating_sub(lines.len()) / 2;
        let mut out = "\n".repeat(top);
        out.push_str(
            &lines
                .iter()
                .map(|l| view::center(l, width))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        out
    }
}

impl BubbleTeaModel for App {
    fn init() -> (Self, Option<Cmd>) {
        let app = match LAUNCH.get() {
            Some(launch) => App::new(&launch.settings, Arc::clone(&launch.cue)),
            None => App::new(&Settings::default(), Arc::new(SilentCue)),
        };
        (app, None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let cmd = self.dispatch(msg);
        self.sync_keys();
        cmd
    }

    fn view(&self) -> String {
        self.render()
    }
}
