//! Rendering helpers: block digits, the help line and centering.

use lipgloss_extras::lipgloss::{Color, Style};
use unicode_width::UnicodeWidthStr;

use crate::key::Binding;

/// Rows in a block digit.
pub const DIGIT_ROWS: usize = 5;

pub(crate) const STONE_400: &str = "#A8A29E";
pub(crate) const STONE_500: &str = "#78716C";
pub(crate) const STONE_700: &str = "#44403C";

#[rustfmt::skip]
const GLYPHS: [[&str; DIGIT_ROWS]; 10] = [
    ["████", "█  █", "█  █", "█  █", "████"],
    ["  █ ", " ██ ", "  █ ", "  █ ", " ███"],
    ["████", "   █", "████", "█   ", "████"],
    ["████", "   █", " ███", "   █", "████"],
    ["█  █", "█  █", "████", "   █", "   █"],
    ["████", "█   ", "████", "   █", "████"],
    ["████", "█   ", "████", "█  █", "████"],
    ["████", "   █", "  █ ", " █  ", " █  "],
    ["████", "█  █", "████", "█  █", "████"],
    ["████", "█  █", "████", "   █", "████"],
];
const BLANK: &str = "    ";

/// Renders `text` as rows of block digits. Non-digits become blanks.
pub fn big_digits(text: &str) -> Vec<String> {
    (0..DIGIT_ROWS)
        .map(|row| {
            text.chars()
                .map(|c| match c.to_digit(10) {
                    Some(d) => GLYPHS[d as usize][row],
                    None => BLANK,
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// `key desc • key desc`, with disabled bindings dimmed.
pub fn help_line(bindings: &[&Binding]) -> String {
    let enabled_key = Style::new().foreground(Color::from(STONE_400)).bold(true);
    let enabled_desc = Style::new().foreground(Color::from(STONE_500));
    let disabled = Style::new().foreground(Color::from(STONE_700));
    let sep = Style::new().foreground(Color::from(STONE_700)).render(" • ");

    bindings
        .iter()
        .filter(|b| !b.help().key.is_empty())
        .map(|b| {
            let help = b.help();
            if b.enabled() {
                format!(
                    "{} {}",
                    enabled_key.render(&help.key),
                    enabled_desc.render(&help.desc)
                )
            } else {
                disabled.render(&format!("{} {}", help.key, help.desc))
            }
        })
        .collect::<Vec<_>>()
        .join(&sep)
}

/// Display width of a possibly styled string.
pub fn visible_width(s: &str) -> usize {
    let plain = strip_ansi_escapes::strip(s);
    String::from_utf8_lossy(&plain).width()
}

/// Pads `line` on the left so it sits in the middle of `width` cells.
pub fn center(line: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_width(line)) / 2;
    format!("{}{}", " ".repeat(pad), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{new_binding, with_help, with_keys_str};

    fn plain(s: &str) -> String {
        String::from_utf8(strip_ansi_escapes::strip(s)).unwrap()
    }

    #[test]
    fn test_big_digits_shape() {
        let rows = big_digits("15");
        assert_eq!(rows.len(), DIGIT_ROWS);
        for row in &rows {
            assert_eq!(row.chars().count(), 9);
        }
        assert_eq!(rows[0], "  █  ████");
        assert_eq!(rows[4], " ███ ████");
    }

    #[test]
    fn test_big_digits_blank_for_non_digits() {
        let rows = big_digits("a");
        assert!(rows.iter().all(|r| r.trim().is_empty()));
        assert!(big_digits("").iter().all(String::is_empty));
    }

    #[test]
    fn test_help_line() {
        let play = new_binding(vec![with_keys_str(&["p"]), with_help("p", "play")]);
        let mut pause = new_binding(vec![with_keys_str(&["s"]), with_help("s", "pause")]);
        pause.set_enabled(false);
        let hidden = new_binding(vec![with_keys_str(&["ctrl+c"])]);

        let line = plain(&help_line(&[&play, &pause, &hidden]));
        assert_eq!(line, "p play • s pause");
    }

    #[test]
    fn test_center() {
        assert_eq!(center("ab", 6), "  ab");
        assert_eq!(center("abcdef", 4), "abcdef");
        let styled = Style::new()
            .foreground(Color::from(crate::progress::FILL_COLOR))
            .render("ab");
        assert_eq!(plain(&center(&styled, 6)), "  ab");
    }
}
