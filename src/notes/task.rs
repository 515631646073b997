use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::utils::duration::format_duration;

/// One markdown checkbox line plus any attached structured time log.
/// Tasks are rebuilt by scanning on every invocation; the markdown file is
/// the record, so there is no stable identifier beyond (file, line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Task description with `due:`/`est:` tokens stripped. Tags stay
    /// visible inline.
    pub text: String,
    /// 1-based line number in the owning file. Not stable across edits.
    pub line: usize,
    /// Leading whitespace count, used for display nesting only.
    pub indent: usize,
    pub due_date: Option<NaiveDate>,
    /// Estimate token stored as-parsed ("2h"), normalized only when
    /// compared.
    pub estimate: Option<String>,
    /// `#token` tags in insertion order, matched case-insensitively.
    pub tags: Vec<String>,
    pub file_path: PathBuf,
    /// Logged sessions in file order.
    pub time_entries: Vec<TimeEntry>,
    /// Running sum of entry durations, or the last `Total:` override seen
    /// in the file.
    pub total_time: Duration,
    /// Free text from a `Remaining:` line.
    pub remaining: Option<String>,
}

impl Task {
    pub fn new(text: String, line: usize, indent: usize, file_path: PathBuf) -> Self {
        Self {
            text,
            line,
            indent,
            due_date: None,
            estimate: None,
            tags: Vec::new(),
            file_path,
            time_entries: Vec::new(),
            total_time: Duration::zero(),
            remaining: None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// One logged work session against a task. The duration is persisted as
/// literal text in the file, so it is stored independently of the
/// start/end pair rather than re-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub duration: Duration,
    pub description: String,
}

impl TimeEntry {
    /// Renders the bit-exact markdown line for this entry:
    /// `  • YYYY-MM-DD HH:MM-HH:MM (duration) - description`.
    pub fn to_markdown(&self) -> String {
        format!(
            "  • {} {}-{} ({}) - {}",
            self.date.format("%Y-%m-%d"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            format_duration(self.duration),
            self.description,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime};

    use super::TimeEntry;

    #[test]
    fn markdown_rendering_matches_grammar() {
        let entry = TimeEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            start: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            end: NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
            duration: Duration::minutes(75),
            description: "Initial component setup".into(),
        };
        assert_eq!(
            entry.to_markdown(),
            "  • 2024-01-15 09:30-10:45 (1h15m) - Initial component setup"
        );
    }
}
