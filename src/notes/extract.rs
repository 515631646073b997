use std::{path::Path, sync::LazyLock};

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use thiserror::Error;

use crate::utils::duration::{parse_duration, InvalidDuration};

use super::task::{Task, TimeEntry};

static TASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)-\s*\[\s*[ xX]?\s*\]\s*(.*)$").unwrap());
static TIME_LOG_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Time log:\s*$").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*•").unwrap());
static REMAINING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Remaining:\s*(.+)$").unwrap());
static TOTAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*Total:\s*(.+)$").unwrap());

// The leading \s* swallows the separating space, so stripping a token out
// of the middle of a line does not leave a double space behind.
static DUE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*due:(\d{4}-\d{2}-\d{2})").unwrap());
static EST_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*est:(\S+)").unwrap());
pub(crate) static TAG_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());

static PAREN_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());

/// What a single line of a note file means to the extractor. Classification
/// is context-free; the state machine in [extract_tasks_from_str] decides
/// what each kind does given the task in progress.
#[derive(Debug, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// A checkbox line. Checked (`[x]`) tasks classify the same as
    /// unchecked ones and are extracted too.
    Task { indent: usize, text: &'a str },
    TimeLogHeader,
    Bullet,
    Remaining(&'a str),
    Total(&'a str),
    Plain,
}

pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(caps) = TASK.captures(line) {
        return LineKind::Task {
            indent: caps.get(1).map_or(0, |m| m.as_str().len()),
            text: caps.get(2).map_or("", |m| m.as_str()),
        };
    }
    if TIME_LOG_HEADER.is_match(line) {
        return LineKind::TimeLogHeader;
    }
    if BULLET.is_match(line) {
        return LineKind::Bullet;
    }
    if let Some(caps) = REMAINING.captures(line) {
        return LineKind::Remaining(caps.get(1).unwrap().as_str());
    }
    if let Some(caps) = TOTAL.captures(line) {
        return LineKind::Total(caps.get(1).unwrap().as_str());
    }
    LineKind::Plain
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryParseError {
    #[error("time entry has no ' - ' separator")]
    MissingSeparator,
    #[error("time entry has no parenthesized duration")]
    MissingDuration,
    #[error(transparent)]
    BadDuration(#[from] InvalidDuration),
    #[error("time entry date does not parse")]
    BadDate,
    #[error("time entry range is not HH:MM-HH:MM")]
    BadTimeRange,
}

/// Parses one time-log bullet of the form
/// `• YYYY-MM-DD HH:MM-HH:MM (duration) - description`.
pub fn parse_time_entry(line: &str) -> Result<TimeEntry, EntryParseError> {
    let line = line.trim().trim_start_matches('•').trim();

    let (time_part, description) = line
        .split_once(" - ")
        .ok_or(EntryParseError::MissingSeparator)?;

    let duration_caps = PAREN_GROUP
        .captures(time_part)
        .ok_or(EntryParseError::MissingDuration)?;
    let duration = parse_duration(duration_caps.get(1).unwrap().as_str())?;

    let time_part = PAREN_GROUP.replace(time_part, "");
    let mut fields = time_part.split_whitespace();
    let (Some(date_str), Some(range), None) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(EntryParseError::BadDate);
    };

    let date =
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| EntryParseError::BadDate)?;

    let mut times = range.split('-');
    let (Some(start_str), Some(end_str), None) = (times.next(), times.next(), times.next())
    else {
        return Err(EntryParseError::BadTimeRange);
    };
    let start = NaiveTime::parse_from_str(start_str, "%H:%M")
        .map_err(|_| EntryParseError::BadTimeRange)?;
    let end =
        NaiveTime::parse_from_str(end_str, "%H:%M").map_err(|_| EntryParseError::BadTimeRange)?;

    Ok(TimeEntry {
        date,
        start,
        end,
        duration,
        description: description.to_string(),
    })
}

/// Reads a note file and extracts its tasks. The only error here is the
/// read itself; inside the file every malformed token degrades at the
/// smallest granularity instead of aborting extraction.
pub async fn extract_tasks(path: &Path) -> std::io::Result<Vec<Task>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(extract_tasks_from_str(&content, path))
}

/// Single forward pass over the file: classify each line, feed the result
/// to a small state machine holding the task in progress and whether a
/// time-log block is open.
pub fn extract_tasks_from_str(content: &str, path: &Path) -> Vec<Task> {
    let mut tasks = Vec::new();
    let mut current: Option<Task> = None;
    let mut in_time_log = false;

    for (index, line) in content.lines().enumerate() {
        match classify(line) {
            LineKind::Task { indent, text } => {
                if let Some(done) = current.take() {
                    tasks.push(done);
                }
                current = Some(new_task(text, index + 1, indent, path));
                in_time_log = false;
            }
            kind => {
                let Some(task) = current.as_mut() else {
                    continue;
                };
                consume(task, kind, line, &mut in_time_log);
            }
        }
    }

    if let Some(done) = current.take() {
        tasks.push(done);
    }

    tasks
}

fn consume(task: &mut Task, kind: LineKind<'_>, line: &str, in_time_log: &mut bool) {
    match kind {
        // Task lines are handled by the caller; everything else lands here.
        LineKind::Task { .. } => {}
        LineKind::TimeLogHeader => *in_time_log = true,
        LineKind::Bullet if *in_time_log => {
            // Malformed entries are dropped; the rest of the block still
            // parses.
            if let Ok(entry) = parse_time_entry(line) {
                task.total_time += entry.duration;
                task.time_entries.push(entry);
            }
        }
        LineKind::Bullet => {}
        LineKind::Remaining(text) => {
            task.remaining = Some(text.trim().to_string());
            *in_time_log = false;
        }
        LineKind::Total(text) => {
            // An explicit total overrides the running sum rather than
            // adding to it.
            if let Ok(duration) = parse_duration(text.trim()) {
                task.total_time = duration;
            }
            *in_time_log = false;
        }
        LineKind::Plain => {
            if !line.starts_with("  ") && !line.trim().is_empty() {
                *in_time_log = false;
            }
        }
    }
}

fn new_task(raw_text: &str, line: usize, indent: usize, path: &Path) -> Task {
    let raw_text = raw_text.trim();
    let mut task = Task::new(String::new(), line, indent, path.to_path_buf());
    let mut text = raw_text.to_string();

    if let Some(caps) = DUE_TOKEN.captures(raw_text) {
        // The token is stripped only when the date actually parses;
        // `due:2024-13-99` stays in the text as written.
        if let Ok(due) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            task.due_date = Some(due);
            text = DUE_TOKEN.replace_all(&text, "").into_owned();
        }
    }

    if let Some(caps) = EST_TOKEN.captures(raw_text) {
        task.estimate = Some(caps[1].to_string());
        text = EST_TOKEN.replace_all(&text, "").into_owned();
    }

    // Tags are collected from the original text but stay in the displayed
    // text, unlike due/estimate tokens.
    for caps in TAG_TOKEN.captures_iter(raw_text) {
        task.tags.push(format!("#{}", &caps[1]));
    }

    task.text = text.trim().to_string();
    task
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;

    fn extract(content: &str) -> Vec<Task> {
        extract_tasks_from_str(content, Path::new("/notes/todos/test.md"))
    }

    #[test]
    fn extracts_metadata_tokens() {
        let tasks = extract("- [ ] Fix auth bug due:2099-01-01 est:2h #urgent\n");
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.text, "Fix auth bug #urgent");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2099, 1, 1));
        assert_eq!(task.estimate.as_deref(), Some("2h"));
        assert_eq!(task.tags, vec!["#urgent"]);
        assert_eq!(task.line, 1);
    }

    #[test]
    fn includes_checked_tasks() {
        let tasks = extract("- [ ] open\n- [x] closed\n- [X] also closed\n");
        let texts: Vec<_> = tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["open", "closed", "also closed"]);
    }

    #[test]
    fn token_stripping_leaves_single_spaces() {
        let tasks = extract("- [ ] Fix est:2h due:2099-01-01 auth bug\n");
        assert_eq!(tasks[0].text, "Fix auth bug");
        assert_eq!(tasks[0].estimate.as_deref(), Some("2h"));
    }

    #[test]
    fn bad_due_date_left_in_text() {
        let tasks = extract("- [ ] Ship it due:2024-13-99\n");
        assert_eq!(tasks[0].text, "Ship it due:2024-13-99");
        assert_eq!(tasks[0].due_date, None);
    }

    #[test]
    fn parses_time_log_block() {
        let content = "\
- [ ] Fix auth bug est:2h
  Time log:
  • 2024-01-15 09:30-10:45 (1h15m) - Initial component setup
  • 2024-01-15 14:00-15:30 (1h30m) - Testing fixes
  Remaining: ~15m
";
        let tasks = extract(content);
        let task = &tasks[0];
        assert_eq!(task.time_entries.len(), 2);
        assert_eq!(task.total_time, Duration::minutes(75 + 90));
        assert_eq!(task.remaining.as_deref(), Some("~15m"));
        assert_eq!(task.time_entries[1].description, "Testing fixes");
    }

    #[test]
    fn remaining_is_a_hard_boundary() {
        let content = "\
- [ ] Task
  Time log:
  • 2024-01-15 09:30-10:00 (30m) - a
  Remaining: 1h
  • 2024-01-15 10:00-11:00 (1h) - after the boundary
";
        let task = &extract(content)[0];
        assert_eq!(task.time_entries.len(), 1);
        assert_eq!(task.total_time, Duration::minutes(30));
    }

    #[test]
    fn total_overrides_running_sum() {
        let content = "\
- [ ] Task
  Time log:
  • 2024-01-15 09:30-10:00 (30m) - a
  Total: 3h
";
        let task = &extract(content)[0];
        assert_eq!(task.total_time, Duration::hours(3));
        // The entries themselves stay.
        assert_eq!(task.time_entries.len(), 1);
    }

    #[test]
    fn unparseable_total_is_ignored() {
        let content = "\
- [ ] Task
  Time log:
  • 2024-01-15 09:30-10:00 (30m) - a
  Total: about three hours
";
        assert_eq!(extract(content)[0].total_time, Duration::minutes(30));
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let content = "\
- [ ] Task
  Time log:
  • not an entry at all
  • 2024-01-15 09:30-10:00 (30m) - good
  • 2024-01-15 09:30-10:00 (soon) - bad duration
";
        let task = &extract(content)[0];
        assert_eq!(task.time_entries.len(), 1);
        assert_eq!(task.time_entries[0].description, "good");
    }

    #[test]
    fn bullets_outside_time_log_are_ignored() {
        let content = "\
- [ ] Task
  • 2024-01-15 09:30-10:00 (30m) - no header above
";
        assert!(extract(content)[0].time_entries.is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let content = "\
# Notes

- [ ] First due:2099-06-01 #work
  Time log:
  • 2024-01-15 09:30-10:45 (1h15m) - setup
some prose
- [x] Second est:30m
";
        let first = extract(content);
        let second = extract(content);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn entry_parse_failures_are_typed() {
        assert_eq!(
            parse_time_entry("• 2024-01-15 09:30-10:45 (1h)").unwrap_err(),
            EntryParseError::MissingSeparator
        );
        assert_eq!(
            parse_time_entry("• 2024-01-15 09:30-10:45 - no duration").unwrap_err(),
            EntryParseError::MissingDuration
        );
        assert_eq!(
            parse_time_entry("• 2024-99-15 09:30-10:45 (1h) - x").unwrap_err(),
            EntryParseError::BadDate
        );
        assert_eq!(
            parse_time_entry("• 2024-01-15 09:30 (1h) - x").unwrap_err(),
            EntryParseError::BadTimeRange
        );
        assert!(matches!(
            parse_time_entry("• 2024-01-15 09:30-10:45 (later) - x").unwrap_err(),
            EntryParseError::BadDuration(_)
        ));
    }

    #[test]
    fn classifier_recognition_order() {
        assert!(matches!(
            classify("  - [ ] indented task"),
            LineKind::Task { indent: 2, .. }
        ));
        assert_eq!(classify("  Time log:"), LineKind::TimeLogHeader);
        assert_eq!(classify("  • anything"), LineKind::Bullet);
        assert_eq!(classify("  Remaining: 2h"), LineKind::Remaining("2h"));
        assert_eq!(classify("  Total: 2h"), LineKind::Total("2h"));
        assert_eq!(classify("plain prose"), LineKind::Plain);
    }
}
