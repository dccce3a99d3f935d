//! Inline editor for the cycle duration.
//!
//! The editor replaces the big number while the timer is stopped. It keeps
//! at most three digits of unconfirmed text; anything else typed or pasted
//! is dropped. Committing parses and clamps the text, falling back to the
//! default duration when there is nothing usable:
//!
//! | buffer   | committed |
//! |----------|-----------|
//! | `""`     | 15        |
//! | `"0"`    | 1         |
//! | `"42"`   | 42        |
//! | `"2000"` | 200 (only three digits are kept while typing) |
//!
//! [`parse_duration`] is the commit rule on its own, for arbitrary text.

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};
use lipgloss_extras::lipgloss::{Color, Style};
use tracing::debug;

use crate::key::{self, KeyMap};
use crate::timer::{clamp_duration, RunState, DEFAULT_DURATION};

/// Maximum number of digits in the buffer.
pub const MAX_DIGITS: usize = 3;

/// Parses committed text: clamp to `[1, 999]`, default 15 when unparsable.
///
/// ```rust
/// use meditation_bell::editor::parse_duration;
///
/// assert_eq!(parse_duration("abc"), 15);
/// assert_eq!(parse_duration(""), 15);
/// assert_eq!(parse_duration("2000"), 999);
/// assert_eq!(parse_duration("0"), 1);
/// ```
pub fn parse_duration(text: &str) -> u32 {
    match text.trim().parse::<u64>() {
        Ok(n) => clamp_duration(n.min(u64::from(u32::MAX)) as u32),
        Err(_) if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) => {
            // Too many digits for u64: as large as it gets.
            clamp_duration(u32::MAX)
        }
        Err(_) => DEFAULT_DURATION,
    }
}

/// Keeps digits only, at most [`MAX_DIGITS`] of them.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_DIGITS)
        .collect()
}

/// Display or editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    /// Showing the timer.
    #[default]
    Display,
    /// Showing the buffer.
    Editing,
}

/// What a key press did to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// Still editing; the buffer may have changed.
    Editing,
    /// Committed this duration and left edit mode.
    Committed(u32),
    /// Left edit mode without a change.
    Cancelled,
    /// Not editing, or the key is not the editor's.
    Ignored,
}

/// Keys understood while editing.
#[derive(Debug, Clone)]
pub struct EditorKeyMap {
    /// Confirm the buffer.
    pub commit: key::Binding,
    /// Drop the buffer.
    pub cancel: key::Binding,
    /// Move focus away, which also commits.
    pub blur: key::Binding,
    /// Delete the last digit.
    pub delete: key::Binding,
}

impl Default for EditorKeyMap {
    fn default() -> Self {
        Self {
            commit: key::new_binding(vec![
                key::with_keys_str(&["enter"]),
                key::with_help("enter", "set"),
            ]),
            cancel: key::new_binding(vec![
                key::with_keys_str(&["esc"]),
                key::with_help("esc", "cancel"),
            ]),
            blur: key::new_binding(vec![key::with_keys_str(&["tab"])]),
            delete: key::new_binding(vec![
                key::with_keys_str(&["backspace", "delete"]),
                key::with_help("⌫", "delete"),
            ]),
        }
    }
}

impl KeyMap for EditorKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.commit, &self.cancel, &self.delete]
    }
}

/// Duration editor state.
#[derive(Debug, Clone, Default)]
pub struct Model {
    state: EditState,
    buffer: String,
    /// Key bindings.
    pub keymap: EditorKeyMap,
}

/// Creates an editor in display mode.
pub fn new() -> Model {
    Model::default()
}

impl Model {
    /// Current state.
    pub fn state(&self) -> EditState {
        self.state
    }

    /// Whether the buffer is showing.
    pub fn editing(&self) -> bool {
        self.state == EditState::Editing
    }

    /// The unconfirmed text.
    pub fn value(&self) -> &str {
        &self.buffer
    }

    /// Enters edit mode seeded with `current`. Refused while running.
    pub fn begin(&mut self, current: u32, run_state: RunState) -> bool {
        if run_state == RunState::Running {
            debug!("edit refused while running");
            return false;
        }
        self.state = EditState::Editing;
        self.buffer = sanitize(&current.to_string());
        true
    }

    /// Replaces the buffer with the digits of `text`.
    pub fn set_input(&mut self, text: &str) {
        self.buffer = sanitize(text);
    }

    /// Parses the buffer and leaves edit mode.
    ///
    /// Returns `None` when not editing.
    pub fn commit(&mut self) -> Option<u32> {
        if !self.editing() {
            return None;
        }
        let duration = parse_duration(&self.buffer);
        self.state = EditState::Display;
        self.buffer.clear();
        Some(duration)
    }

    /// Drops the buffer and leaves edit mode.
    pub fn cancel(&mut self) {
        self.state = EditState::Display;
        self.buffer.clear();
    }

    /// Handles a key press while editing.
    pub fn update(&mut self, msg: &KeyMsg) -> EditorEvent {
        if !self.editing() {
            return EditorEvent::Ignored;
        }

        if self.keymap.commit.matches(msg) || self.keymap.blur.matches(msg) {
            return self
                .commit()
                .map_or(EditorEvent::Ignored, EditorEvent::Committed);
        }
        if self.keymap.cancel.matches(msg) {
            self.cancel();
            return EditorEvent::Cancelled;
        }
        if self.keymap.delete.matches(msg) {
            self.buffer.pop();
            return EditorEvent::Editing;
        }

        if let KeyCode::Char(ch) = msg.key {
            if msg.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                return EditorEvent::Ignored;
            }
            if ch.is_ascii_digit() && self.buffer.len() < MAX_DIGITS {
                self.buffer.push(ch);
            }
            return EditorEvent::Editing;
        }
        EditorEvent::Ignored
    }

    /// The buffer followed by a block cursor, at least two cells wide.
    pub fn view(&self) -> String {
        let text = format!("{:<2}", self.buffer);
        let cursor = Style::new()
            .foreground(Color::from(crate::progress::FILL_COLOR))
            .render("▏");
        format!("{text}{cursor}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyMsg {
        KeyMsg {
            key: code,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn editing(text: &str) -> Model {
        let mut editor = new();
        assert!(editor.begin(15, RunState::Stopped));
        editor.set_input(text);
        editor
    }

    #[test]
    fn test_parse_duration_rules() {
        assert_eq!(parse_duration("abc"), DEFAULT_DURATION);
        assert_eq!(parse_duration(""), DEFAULT_DURATION);
        assert_eq!(parse_duration("2000"), 999);
        assert_eq!(parse_duration("0"), 1);
        assert_eq!(parse_duration("007"), 7);
        assert_eq!(parse_duration("99999999999999999999999"), 999);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("1a2b3c4"), "123");
        assert_eq!(sanitize("abc"), "");
        assert_eq!(sanitize(" 4 5 "), "45");
    }

    #[test]
    fn test_begin_refused_while_running() {
        let mut editor = new();
        assert!(!editor.begin(10, RunState::Running));
        assert_eq!(editor.state(), EditState::Display);
        assert!(!editor.editing());
    }

    #[test]
    fn test_begin_seeds_buffer() {
        let mut editor = new();
        assert!(editor.begin(12, RunState::Stopped));
        assert_eq!(editor.state(), EditState::Editing);
        assert_eq!(editor.value(), "12");
    }

    #[test]
    fn test_commit_fallbacks_and_clamps() {
        assert_eq!(editing("abc").commit(), Some(15));
        assert_eq!(editing("").commit(), Some(15));
        assert_eq!(editing("0").commit(), Some(1));
        assert_eq!(editing("999").commit(), Some(999));
        // Only three digits survive the input filter.
        assert_eq!(editing("2000").commit(), Some(200));
    }

    #[test]
    fn test_commit_leaves_edit_mode() {
        let mut editor = editing("30");
        assert_eq!(editor.commit(), Some(30));
        assert_eq!(editor.state(), EditState::Display);
        assert_eq!(editor.commit(), None);
    }

    #[test]
    fn test_cancel_discards() {
        let mut editor = editing("30");
        editor.cancel();
        assert_eq!(editor.state(), EditState::Display);
        assert_eq!(editor.value(), "");
    }

    #[test]
    fn test_typing_digits() {
        let mut editor = editing("");
        for ch in ['4', 'x', '2', '1', '9'] {
            assert_eq!(editor.update(&press(KeyCode::Char(ch))), EditorEvent::Editing);
        }
        assert_eq!(editor.value(), "421");

        editor.update(&press(KeyCode::Backspace));
        assert_eq!(editor.value(), "42");

        assert_eq!(editor.update(&press(KeyCode::Enter)), EditorEvent::Committed(42));
    }

    #[test]
    fn test_escape_cancels() {
        let mut editor = editing("5");
        assert_eq!(editor.update(&press(KeyCode::Esc)), EditorEvent::Cancelled);
        assert!(!editor.editing());
    }

    #[test]
    fn test_tab_commits() {
        let mut editor = editing("8");
        assert_eq!(editor.update(&press(KeyCode::Tab)), EditorEvent::Committed(8));
        assert!(!editor.editing());
    }

    #[test]
    fn test_keys_ignored_when_not_editing() {
        let mut editor = new();
        assert_eq!(editor.update(&press(KeyCode::Char('1'))), EditorEvent::Ignored);
        assert_eq!(editor.value(), "");
    }

    #[test]
    fn test_control_chords_ignored() {
        let mut editor = editing("");
        let msg = KeyMsg {
            key: KeyCode::Char('1'),
            modifiers: KeyModifiers::CONTROL,
        };
        assert_eq!(editor.update(&msg), EditorEvent::Ignored);
        assert_eq!(editor.value(), "");
    }
}
