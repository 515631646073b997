//! Shared terminal rendering helpers for the command handlers.

use std::path::Path;

use ansi_term::{ANSIString, Colour, Style};
use chrono::NaiveDate;

use crate::notes::filter::Priority;

pub const GRAY: Colour = Colour::Fixed(8);

pub fn header(text: &str) -> ANSIString<'_> {
    Colour::Cyan.bold().paint(text)
}

pub fn dim(text: &str) -> ANSIString<'_> {
    GRAY.paint(text)
}

pub fn bold(text: &str) -> ANSIString<'_> {
    Style::new().bold().paint(text)
}

pub fn rule(width: usize) -> String {
    GRAY.paint("─".repeat(width)).to_string()
}

pub fn pluralize(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Truncates to `max` characters, ellipsis included.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Path relative to the notes root, falling back to the full path for
/// files outside it.
pub fn rel_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

pub fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "⚪",
    }
}

pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Colour::Red.bold(),
        Priority::Medium => Colour::Yellow.bold(),
        Priority::Low => GRAY.normal(),
    }
}

/// Human phrasing of a due date relative to today.
pub fn relative_due(due: NaiveDate, today: NaiveDate) -> String {
    match (due - today).num_days() {
        0 => "today".to_string(),
        -1 => "1 day overdue".to_string(),
        days if days < 0 => format!("{} days overdue", -days),
        1 => "tomorrow".to_string(),
        days => format!("in {days} days"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn relative_due_phrases() {
        assert_eq!(relative_due(day(15), day(15)), "today");
        assert_eq!(relative_due(day(14), day(15)), "1 day overdue");
        assert_eq!(relative_due(day(10), day(15)), "5 days overdue");
        assert_eq!(relative_due(day(16), day(15)), "tomorrow");
        assert_eq!(relative_due(day(20), day(15)), "in 5 days");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("short", 60), "short");
        assert_eq!(truncate("abcdefgh", 6), "abc...");
        let wide = "é".repeat(70);
        assert_eq!(truncate(&wide, 60).chars().count(), 60);
    }

    #[test]
    fn rel_path_falls_back_outside_the_root() {
        let root = Path::new("/notes");
        assert_eq!(rel_path(root, Path::new("/notes/daily/a.md")), "daily/a.md");
        assert_eq!(rel_path(root, Path::new("/tmp/b.md")), "/tmp/b.md");
    }
}
