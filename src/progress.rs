//! Cycle progress bar.
//!
//! A thin horizontal bar that fills as the cycle advances. Moving forward is
//! animated with a damped spring so the fill glides through the second
//! instead of jumping; moving backward (a new cycle, a reset) snaps.
//!
//! ```rust
//! use meditation_bell::progress::{new, with_width, without_percentage};
//!
//! let mut bar = new(&[with_width(20), without_percentage()]);
//! let _frame = bar.set_percent(0.5);
//! assert_eq!(bar.percent(), 0.5);
//! ```

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use lipgloss_extras::lipgloss::{Color, Style};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

const FPS: u32 = 60;
const DEFAULT_WIDTH: i32 = 40;
const DEFAULT_FREQUENCY: f64 = 64.0;
const DEFAULT_DAMPING: f64 = 16.0;

/// Amber, the bell's accent color.
pub const FILL_COLOR: &str = "#F59E0B";
/// Dark stone track.
pub const TRACK_COLOR: &str = "#292524";

/// Construction options for [`new`].
///
/// Options are applied in order, so a later option wins over an earlier one
/// touching the same field.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::progress::{new, with_fill_characters, with_width, without_percentage};
///
/// let bar = new(&[
///     with_width(30),
///     with_fill_characters('█', '░'),
///     without_percentage(),
/// ]);
/// assert_eq!(bar.width, 30);
/// assert_eq!(bar.full, '█');
/// ```
pub enum ProgressOption {
    /// Fill color.
    WithFillColor(String),
    /// Fill and track characters.
    WithFillCharacters(char, char),
    /// Hide the trailing percentage.
    WithoutPercentage,
    /// Total width in cells, percentage included.
    WithWidth(i32),
    /// Spring frequency and damping.
    WithSpringOptions(f64, f64),
    /// Disable animation; the bar always shows its target.
    WithoutAnimation,
}

impl ProgressOption {
    fn apply(&self, m: &mut Model) {
        match self {
            ProgressOption::WithFillColor(color) => m.full_color = color.clone(),
            ProgressOption::WithFillCharacters(full, empty) => {
                m.full = *full;
                m.empty = *empty;
            }
            ProgressOption::WithoutPercentage => m.show_percentage = false,
            ProgressOption::WithWidth(width) => m.width = *width,
            ProgressOption::WithSpringOptions(frequency, damping) => {
                m.spring = Spring::new(f64::from(FPS), *frequency, *damping);
            }
            ProgressOption::WithoutAnimation => m.animate = false,
        }
    }
}

/// Sets the fill color. Accepts anything lipgloss understands as a color,
/// usually a hex code.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::progress::{new, with_fill_color};
///
/// let bar = new(&[with_fill_color("#10B981")]);
/// assert_eq!(bar.full_color, "#10B981");
/// ```
pub fn with_fill_color(color: &str) -> ProgressOption {
    ProgressOption::WithFillColor(color.to_string())
}

/// Sets the fill and track characters.
pub fn with_fill_characters(full: char, empty: char) -> ProgressOption {
    ProgressOption::WithFillCharacters(full, empty)
}

/// Hides the percentage.
pub fn without_percentage() -> ProgressOption {
    ProgressOption::WithoutPercentage
}

/// Sets the total width in cells, percentage included.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::progress::{new, with_width, without_percentage};
///
/// let bar = new(&[with_width(12), without_percentage()]);
/// assert_eq!(bar.width, 12);
/// ```
pub fn with_width(w: i32) -> ProgressOption {
    ProgressOption::WithWidth(w)
}

/// Tunes the spring that animates forward moves.
///
/// `frequency` is the stiffness pulling the fill toward its target and
/// `damping` slows it down. A damping of `2 * frequency.sqrt()` settles
/// without overshooting.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::progress::{new, with_spring_options};
///
/// // Slower, softer glide.
/// let mut bar = new(&[with_spring_options(16.0, 8.0)]);
/// assert!(bar.set_percent(0.25).is_some());
/// ```
pub fn with_spring_options(frequency: f64, damping: f64) -> ProgressOption {
    ProgressOption::WithSpringOptions(frequency, damping)
}

/// Turns animation off; the bar jumps straight to every target.
///
/// # Examples
///
/// ```rust
/// use meditation_bell::progress::{new, without_animation};
///
/// let mut bar = new(&[without_animation()]);
/// assert!(bar.set_percent(0.75).is_none());
/// assert_eq!(bar.shown(), 0.75);
/// ```
pub fn without_animation() -> ProgressOption {
    ProgressOption::WithoutAnimation
}

/// One animation frame for the bar with matching id and tag.
#[derive(Debug, Clone)]
pub struct FrameMsg {
    id: i64,
    tag: i64,
}

#[derive(Debug, Clone)]
struct Spring {
    frequency: f64,
    damping: f64,
    fps: f64,
}

impl Spring {
    fn new(fps: f64, frequency: f64, damping: f64) -> Self {
        Self {
            frequency,
            damping,
            fps,
        }
    }

    fn update(&self, position: f64, velocity: f64, target: f64) -> (f64, f64) {
        let dt = 1.0 / self.fps;
        let acceleration = -self.frequency * (position - target) - self.damping * velocity;
        let velocity = velocity + acceleration * dt;
        (position + velocity * dt, velocity)
    }
}

/// Progress bar state.
#[derive(Debug, Clone)]
pub struct Model {
    id: i64,
    tag: i64,

    /// Total width in cells, percentage included.
    pub width: i32,
    /// Fill character.
    pub full: char,
    /// Fill color.
    pub full_color: String,
    /// Track character.
    pub empty: char,
    /// Track color.
    pub empty_color: String,
    /// Whether to append the percentage.
    pub show_percentage: bool,

    animate: bool,
    spring: Spring,
    shown: f64,
    target: f64,
    velocity: f64,
}

/// Creates a bar with the given options.
pub fn new(opts: &[ProgressOption]) -> Model {
    let mut m = Model {
        id: next_id(),
        tag: 0,
        width: DEFAULT_WIDTH,
        full: '━',
        full_color: FILL_COLOR.to_string(),
        empty: '━',
        empty_color: TRACK_COLOR.to_string(),
        show_percentage: true,
        animate: true,
        spring: Spring::new(f64::from(FPS), DEFAULT_FREQUENCY, DEFAULT_DAMPING),
        shown: 0.0,
        target: 0.0,
        velocity: 0.0,
    };
    for opt in opts {
        opt.apply(&mut m);
    }
    m
}

impl Model {
    /// The target fraction.
    pub fn percent(&self) -> f64 {
        self.target
    }

    /// The fraction currently drawn.
    pub fn shown(&self) -> f64 {
        self.shown
    }

    /// Sets the target fraction, clamped to `[0, 1]`.
    ///
    /// Returns the first animation frame when the bar needs to move forward.
    pub fn set_percent(&mut self, p: f64) -> Option<Cmd> {
        let p = p.clamp(0.0, 1.0);
        self.target = p;
        self.tag += 1;

        if !self.animate || p < self.shown {
            self.shown = p;
            self.velocity = 0.0;
            return None;
        }
        if !self.is_animating() {
            return None;
        }
        Some(self.next_frame())
    }

    /// Whether the drawn fraction is still moving toward the target.
    pub fn is_animating(&self) -> bool {
        let dist = (self.shown - self.target).abs();
        !(dist < 0.001 && self.velocity.abs() < 0.01)
    }

    /// Advances the animation on this bar's [`FrameMsg`].
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let frame = msg.downcast_ref::<FrameMsg>()?;
        if frame.id != self.id || frame.tag != self.tag {
            return None;
        }
        if !self.is_animating() {
            self.shown = self.target;
            self.velocity = 0.0;
            return None;
        }

        let (shown, velocity) = self.spring.update(self.shown, self.velocity, self.target);
        // Never overshoot past the end of the track.
        self.shown = shown.clamp(0.0, 1.0);
        self.velocity = velocity;
        Some(self.next_frame())
    }

    fn next_frame(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;
        let frame = Duration::from_nanos(1_000_000_000 / u64::from(FPS));
        bubbletea_tick(frame, move |_| Box::new(FrameMsg { id, tag }) as Msg)
    }

    /// Renders the bar at its drawn fraction.
    pub fn view(&self) -> String {
        self.view_as(self.shown)
    }

    /// Renders the bar at an arbitrary fraction.
    pub fn view_as(&self, percent: f64) -> String {
        let percent = percent.clamp(0.0, 1.0);
        let percentage = if self.show_percentage {
            format!(" {:3.0}%", percent * 100.0)
        } else {
            String::new()
        };
        let track = (self.width - percentage.chars().count() as i32).max(0);
        let filled = ((f64::from(track) * percent).round() as i32).clamp(0, track);

        let full = Style::new()
            .foreground(Color::from(self.full_color.as_str()))
            .render(&self.full.to_string().repeat(filled as usize));
        let empty = Style::new()
            .foreground(Color::from(self.empty_color.as_str()))
            .render(&self.empty.to_string().repeat((track - filled) as usize));

        format!("{full}{empty}{percentage}")
    }
}

impl Default for Model {
    fn default() -> Self {
        new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> String {
        String::from_utf8(strip_ansi_escapes::strip(s)).unwrap()
    }

    fn frame_for(bar: &Model) -> Msg {
        Box::new(FrameMsg {
            id: bar.id,
            tag: bar.tag,
        })
    }

    #[test]
    fn test_defaults() {
        let bar = new(&[]);
        assert_eq!(bar.width, DEFAULT_WIDTH);
        assert!(bar.show_percentage);
        assert_eq!(bar.percent(), 0.0);
        assert!(!bar.is_animating());
    }

    #[test]
    fn test_options() {
        let bar = new(&[
            with_width(10),
            without_percentage(),
            with_fill_characters('#', '.'),
            with_fill_color("#FF0000"),
        ]);
        assert_eq!(bar.width, 10);
        assert!(!bar.show_percentage);
        assert_eq!(bar.full, '#');
        assert_eq!(bar.empty, '.');
        assert_eq!(bar.full_color, "#FF0000");
    }

    #[test]
    fn test_set_percent_clamps() {
        let mut bar = new(&[]);
        let _ = bar.set_percent(1.5);
        assert_eq!(bar.percent(), 1.0);
        let _ = bar.set_percent(-0.5);
        assert_eq!(bar.percent(), 0.0);
    }

    #[test]
    fn test_forward_move_animates() {
        let mut bar = new(&[]);
        assert!(bar.set_percent(0.5).is_some());
        assert_eq!(bar.shown(), 0.0);

        let mut frames = 0;
        while bar.update(frame_for(&bar)).is_some() {
            frames += 1;
            assert!(frames < 10_000, "animation never settled");
        }
        assert!((bar.shown() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_backward_move_snaps() {
        let mut bar = new(&[without_animation()]);
        let _ = bar.set_percent(0.9);
        assert_eq!(bar.shown(), 0.9);

        let mut bar = new(&[]);
        bar.shown = 0.9;
        bar.target = 0.9;
        assert!(bar.set_percent(0.0).is_none());
        assert_eq!(bar.shown(), 0.0);
    }

    #[test]
    fn test_stale_frame_ignored() {
        let mut bar = new(&[]);
        let _ = bar.set_percent(0.3);
        let stale = frame_for(&bar);
        let _ = bar.set_percent(0.6);
        assert!(bar.update(stale).is_none());
        assert_eq!(bar.shown(), 0.0);
    }

    #[test]
    fn test_view_widths() {
        let bar = new(&[with_width(10), without_percentage(), with_fill_characters('#', '.')]);
        assert_eq!(plain(&bar.view_as(0.0)), "..........");
        assert_eq!(plain(&bar.view_as(0.5)), "#####.....");
        assert_eq!(plain(&bar.view_as(1.0)), "##########");
    }

    #[test]
    fn test_view_with_percentage() {
        let bar = new(&[with_width(15), with_fill_characters('#', '.')]);
        let view = plain(&bar.view_as(0.5));
        assert!(view.ends_with("  50%"), "got {view:?}");
        assert_eq!(view.chars().count(), 15);
    }
}
