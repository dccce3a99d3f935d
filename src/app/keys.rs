//! Key bindings for the bell screen.

use crate::key::{self, KeyMap};

/// Keys available while the big number is showing.
#[derive(Debug, Clone)]
pub struct AppKeyMap {
    /// Start the timer.
    pub play: key::Binding,
    /// Pause the timer.
    pub pause: key::Binding,
    /// Start or pause.
    pub toggle: key::Binding,
    /// Stop and rewind.
    pub reset: key::Binding,
    /// Edit the duration.
    pub edit: key::Binding,
    /// Leave the program.
    pub quit: key::Binding,
    /// Leave the program, even while editing.
    pub force_quit: key::Binding,
}

impl Default for AppKeyMap {
    fn default() -> Self {
        Self {
            play: key::new_binding(vec![
                key::with_keys_str(&["p"]),
                key::with_help("p", "play"),
            ]),
            pause: key::new_binding(vec![
                key::with_keys_str(&["s"]),
                key::with_help("s", "pause"),
            ]),
            toggle: key::new_binding(vec![
                key::with_keys_str(&["space"]),
                key::with_help("space", "play/pause"),
            ]),
            reset: key::new_binding(vec![
                key::with_keys_str(&["r"]),
                key::with_help("r", "reset"),
            ]),
            edit: key::new_binding(vec![
                key::with_keys_str(&["e", "enter"]),
                key::with_help("e", "edit"),
            ]),
            quit: key::new_binding(vec![
                key::with_keys_str(&["q"]),
                key::with_help("q", "quit"),
            ]),
            force_quit: key::new_binding(vec![key::with_keys_str(&["ctrl+c"])]),
        }
    }
}

impl KeyMap for AppKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![
            &self.play,
            &self.pause,
            &self.toggle,
            &self.reset,
            &self.edit,
            &self.quit,
        ]
    }
}
