use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use thiserror::Error;

use super::task::TimeEntry;

/// How far below its task line a `Time log:` marker may sit.
const MARKER_SCAN_WINDOW: usize = 10;

const DEFAULT_DESCRIPTION: &str = "Work session";

#[derive(Debug, Error)]
pub enum TimeLogError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("task line {line} not found in file of {len} lines")]
    LineOutOfRange { line: usize, len: usize },
}

/// Port for recording a finished work session against a task. The timer
/// depends on this trait, not on the markdown writer directly, so its
/// tests run against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeLog: Send + Sync + 'static {
    async fn append(
        &self,
        path: &Path,
        task_line: usize,
        start: DateTime<Local>,
        elapsed: Duration,
    ) -> Result<(), TimeLogError>;
}

/// The real writer: inserts a formatted entry into the task's time-log
/// block in its markdown file, leaving every other line untouched.
pub struct MarkdownTimeLog;

#[async_trait]
impl TimeLog for MarkdownTimeLog {
    async fn append(
        &self,
        path: &Path,
        task_line: usize,
        start: DateTime<Local>,
        elapsed: Duration,
    ) -> Result<(), TimeLogError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| TimeLogError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let entry = TimeEntry {
            date: start.date_naive(),
            start: start.time(),
            end: (start + elapsed).time(),
            duration: elapsed,
            description: DEFAULT_DESCRIPTION.into(),
        };

        let updated = insert_entry(&content, task_line, &entry)?;
        write_atomically(path, &updated).await
    }
}

/// Splices the entry into the right place: after an existing `Time log:`
/// marker (past its bullets, before a trailing `Remaining:`/`Total:`), or
/// as a fresh two-line block right under the task line.
pub fn insert_entry(
    content: &str,
    task_line: usize,
    entry: &TimeEntry,
) -> Result<String, TimeLogError> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    if task_line > lines.len() {
        return Err(TimeLogError::LineOutOfRange {
            line: task_line,
            len: lines.len(),
        });
    }

    // `task_line` is 1-based, so as an index it already points at the line
    // after the task.
    let mut insert_at = task_line;
    let mut marker_found = false;

    for i in task_line..lines.len().min(task_line + MARKER_SCAN_WINDOW) {
        if lines[i].contains("Time log:") {
            marker_found = true;
            insert_at = i + 1;
            for j in i + 1..lines.len() {
                if !lines[j].starts_with("  ") {
                    break;
                }
                if lines[j].contains("Remaining:") || lines[j].contains("Total:") {
                    insert_at = j;
                    break;
                }
                if lines[j].starts_with("  •") {
                    insert_at = j + 1;
                }
            }
            break;
        }
        // A non-indented, non-blank line past the first marks the end of
        // this task's territory.
        if i > task_line && !lines[i].starts_with("  ") && !lines[i].trim().is_empty() {
            break;
        }
    }

    let rendered = entry.to_markdown();
    if marker_found {
        lines.insert(insert_at, &rendered);
    } else {
        lines.insert(insert_at, "  Time log:");
        lines.insert(insert_at + 1, &rendered);
    }

    Ok(lines.join("\n"))
}

/// Write-replace through a temp sibling so a crash never leaves a
/// half-written note behind.
async fn write_atomically(path: &Path, content: &str) -> Result<(), TimeLogError> {
    let write_err = |source| TimeLogError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "note".into());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, content).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use tempfile::tempdir;

    use crate::notes::extract::extract_tasks_from_str;

    use super::*;

    fn entry(minutes: i64) -> TimeEntry {
        TimeEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            start: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            end: NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
            duration: Duration::minutes(minutes),
            description: "Work session".into(),
        }
    }

    #[test]
    fn creates_block_when_marker_is_missing() {
        let content = "# Notes\n- [ ] Fix auth bug\nprose below\n";
        let updated = insert_entry(content, 2, &entry(75)).unwrap();
        assert_eq!(
            updated,
            "# Notes\n\
             - [ ] Fix auth bug\n\
             \x20\x20Time log:\n\
             \x20\x20• 2024-01-15 09:30-10:45 (1h15m) - Work session\n\
             prose below\n"
        );
    }

    #[test]
    fn appends_after_existing_bullets() {
        let content = "\
- [ ] Task
  Time log:
  • 2024-01-10 08:00-09:00 (1h) - earlier
tail
";
        let updated = insert_entry(content, 1, &entry(75)).unwrap();
        let lines: Vec<&str> = updated.split('\n').collect();
        assert_eq!(
            lines[3],
            "  • 2024-01-15 09:30-10:45 (1h15m) - Work session"
        );
        assert_eq!(lines[4], "tail");
    }

    #[test]
    fn inserts_before_remaining_line() {
        let content = "\
- [ ] Task
  Time log:
  • 2024-01-10 08:00-09:00 (1h) - earlier
  Remaining: 2h
";
        let updated = insert_entry(content, 1, &entry(75)).unwrap();
        let lines: Vec<&str> = updated.split('\n').collect();
        assert_eq!(
            lines[3],
            "  • 2024-01-15 09:30-10:45 (1h15m) - Work session"
        );
        assert_eq!(lines[4], "  Remaining: 2h");
    }

    #[test]
    fn inserts_before_total_line() {
        let content = "\
- [ ] Task
  Time log:
  Total: 1h
";
        let updated = insert_entry(content, 1, &entry(75)).unwrap();
        let lines: Vec<&str> = updated.split('\n').collect();
        assert_eq!(
            lines[2],
            "  • 2024-01-15 09:30-10:45 (1h15m) - Work session"
        );
        assert_eq!(lines[3], "  Total: 1h");
    }

    #[test]
    fn line_out_of_range_is_typed() {
        let err = insert_entry("- [ ] only task\n", 40, &entry(10)).unwrap_err();
        assert!(matches!(
            err,
            TimeLogError::LineOutOfRange { line: 40, .. }
        ));
    }

    #[test]
    fn marker_outside_scan_window_is_ignored() {
        let mut content = String::from("- [ ] Task\n");
        for _ in 0..12 {
            content.push_str("  filler\n");
        }
        content.push_str("  Time log:\n");
        let updated = insert_entry(&content, 1, &entry(10)).unwrap();
        // A fresh block goes right under the task instead.
        assert!(updated.starts_with("- [ ] Task\n  Time log:\n  • "));
    }

    #[tokio::test]
    async fn written_entry_survives_re_extraction() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("todos.md");
        let original = "# Today\n\n- [ ] Fix auth bug est:2h\n\n- [ ] Other task\n";
        std::fs::write(&path, original)?;

        let start = Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        MarkdownTimeLog
            .append(&path, 3, start, Duration::minutes(75))
            .await?;

        let updated = std::fs::read_to_string(&path)?;
        let tasks = extract_tasks_from_str(&updated, &path);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].time_entries.len(), 1);
        assert_eq!(tasks[0].time_entries[0].duration, Duration::minutes(75));
        assert_eq!(tasks[0].time_entries[0].description, "Work session");

        // Everything except the inserted block is untouched.
        let expected = "# Today\n\n\
                        - [ ] Fix auth bug est:2h\n\
                        \x20\x20Time log:\n\
                        \x20\x20• 2024-01-15 09:30-10:45 (1h15m) - Work session\n\n\
                        - [ ] Other task\n";
        assert_eq!(updated, expected);
        Ok(())
    }
}
