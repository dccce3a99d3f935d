//! Key bindings for the bell's components.
//!
//! A [`Binding`] is a set of key presses plus the help text shown for it in
//! the footer. Bindings are built from human readable key strings such as
//! `"space"`, `"ctrl+c"` or `"e"`:
//!
//! ```rust
//! use meditation_bell::key::{new_binding, with_help, with_keys_str};
//!
//! let reset = new_binding(vec![with_keys_str(&["r"]), with_help("r", "reset")]);
//! assert_eq!(reset.help().key, "r");
//! ```
//!
//! A disabled binding never matches and is rendered dimmed by the help
//! line, which is how the app greys out "play" while the bell is running.

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};

/// A single key press: a key code plus the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key itself.
    pub code: KeyCode,
    /// Required modifiers. Shift is ignored when matching characters.
    pub modifiers: KeyModifiers,
}

impl KeyPress {
    /// Parses a key string like `"ctrl+c"`, `"enter"` or `"q"`.
    ///
    /// Returns `None` for strings that do not name a key.
    pub fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let mut rest = s;
        loop {
            if let Some(r) = rest.strip_prefix("ctrl+") {
                modifiers |= KeyModifiers::CONTROL;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("alt+") {
                modifiers |= KeyModifiers::ALT;
                rest = r;
            } else {
                break;
            }
        }

        let code = match rest {
            "space" | " " => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "esc" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "delete" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pgup" => KeyCode::PageUp,
            "pgdown" => KeyCode::PageDown,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };

        Some(Self { code, modifiers })
    }

    /// Whether this press matches the incoming key message.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        if self.code != msg.key {
            return false;
        }
        let held = if matches!(msg.key, KeyCode::Char(_)) {
            msg.modifiers.difference(KeyModifiers::SHIFT)
        } else {
            msg.modifiers
        };
        held == self.modifiers
    }
}

/// Help text for a binding, rendered in the footer as `key desc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    /// Short label for the key(s), e.g. `"space"`.
    pub key: String,
    /// What the key does, e.g. `"play/pause"`.
    pub desc: String,
}

/// A named group of key presses with help text.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    disabled: bool,
}

/// Options applied by [`new_binding`].
pub enum BindingOpt {
    /// Key strings to bind.
    Keys(Vec<String>),
    /// Help label and description.
    Help(String, String),
    /// Start disabled.
    Disabled,
}

/// Builds a binding from a list of options.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::key::{new_binding, with_help, with_keys_str};
///
/// let toggle = new_binding(vec![
///     with_keys_str(&["space"]),
///     with_help("space", "play/pause"),
/// ]);
/// assert!(toggle.enabled());
/// assert_eq!(toggle.keys().len(), 1);
/// ```
pub fn new_binding(opts: Vec<BindingOpt>) -> Binding {
    let mut binding = Binding::default();
    for opt in opts {
        match opt {
            BindingOpt::Keys(keys) => binding.set_keys(&keys),
            BindingOpt::Help(key, desc) => binding.set_help(key, desc),
            BindingOpt::Disabled => binding.disabled = true,
        }
    }
    binding
}

/// Binds the given key strings. Unknown strings are skipped.
///
/// Recognised names are `space`, `enter`, `esc`, `tab`, `backspace`,
/// `delete`, the arrows, `home`, `end`, `pgup` and `pgdown`, plus any single
/// character. Prefix with `ctrl+` or `alt+` for chords.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::key::{new_binding, with_keys_str};
///
/// let quit = new_binding(vec![with_keys_str(&["q", "ctrl+c", "not-a-key"])]);
/// assert_eq!(quit.keys().len(), 2);
/// ```
pub fn with_keys_str(keys: &[&str]) -> BindingOpt {
    BindingOpt::Keys(keys.iter().map(|k| k.to_string()).collect())
}

/// Sets the help label and description.
pub fn with_help(key: &str, desc: &str) -> BindingOpt {
    BindingOpt::Help(key.to_string(), desc.to_string())
}

/// Creates the binding disabled.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::key::{new_binding, with_disabled, with_keys_str};
///
/// let mut pause = new_binding(vec![with_keys_str(&["s"]), with_disabled()]);
/// assert!(!pause.enabled());
/// pause.set_enabled(true);
/// assert!(pause.enabled());
/// ```
pub fn with_disabled() -> BindingOpt {
    BindingOpt::Disabled
}

impl Binding {
    /// Replaces the bound keys.
    pub fn set_keys<S: AsRef<str>>(&mut self, keys: &[S]) {
        self.keys = keys
            .iter()
            .filter_map(|k| KeyPress::parse(k.as_ref()))
            .collect();
    }

    /// Replaces the help text.
    pub fn set_help(&mut self, key: impl Into<String>, desc: impl Into<String>) {
        self.help = Help {
            key: key.into(),
            desc: desc.into(),
        };
    }

    /// The bound key presses.
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    /// Help text for the footer.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// Enables or disables the binding.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.disabled = !enabled;
    }

    /// A binding is enabled when it is not disabled and has at least one key.
    pub fn enabled(&self) -> bool {
        !self.disabled && !self.keys.is_empty()
    }

    /// Whether an enabled binding matches the key message.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        self.enabled() && self.keys.iter().any(|k| k.matches(msg))
    }
}

/// Reports whether any of the bindings matches the key message.
pub fn matches(msg: &KeyMsg, bindings: &[&Binding]) -> bool {
    bindings.iter().any(|b| b.matches(msg))
}

/// Components with key bindings implement this to feed the help line.
pub trait KeyMap {
    /// Bindings shown in the single-line help footer, in order.
    fn short_help(&self) -> Vec<&Binding>;
}
