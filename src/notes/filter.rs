use std::fmt::Display;

use chrono::NaiveDate;
use clap::ValueEnum;

use super::task::Task;

const HIGH_PRIORITY_KEYWORDS: &[&str] = &["urgent", "asap", "critical", "important", "!!!"];
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["!!", "soon", "priority"];

const QUICK_KEYWORDS: &[&str] = &["quick", "simple", "easy", "fix typo"];
const ENERGY_KEYWORDS: &[&str] = &["design", "architecture", "refactor", "implement"];
const BLOCKED_KEYWORDS: &[&str] = &["blocked", "waiting", "pending"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Keyword scan over the task text, first hit wins: high keywords, then
/// medium, else low. A rule list, not a scored model.
pub fn detect_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::High
    } else if MEDIUM_PRIORITY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    /// Priority, then due date (no due date last), then file path.
    Priority,
    /// File path only.
    File,
    /// Due date (no due date last), then file path.
    Due,
}

#[derive(Debug, Default, Clone)]
pub struct TaskFilters {
    pub tags: Vec<String>,
    pub priority: Option<Priority>,
    pub overdue: bool,
    pub today: bool,
    pub file_pattern: Option<String>,
    pub sort_by: Option<SortBy>,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.priority.is_none()
            && !self.overdue
            && !self.today
            && self.file_pattern.is_none()
    }
}

/// Applies all requested criteria with AND semantics, except that overdue
/// and today requested together OR into focus mode (overdue OR due today).
pub fn filter_tasks(tasks: Vec<Task>, filters: &TaskFilters, today: NaiveDate) -> Vec<Task> {
    if filters.is_empty() {
        return tasks;
    }
    tasks
        .into_iter()
        .filter(|task| matches_filters(task, filters, today))
        .collect()
}

fn matches_filters(task: &Task, filters: &TaskFilters, today: NaiveDate) -> bool {
    if !filters.tags.is_empty() && !filters.tags.iter().any(|tag| task.has_tag(tag)) {
        return false;
    }

    if let Some(wanted) = filters.priority {
        if detect_priority(&task.text) != wanted {
            return false;
        }
    }

    if filters.overdue && filters.today {
        // Focus mode: overdue OR due today.
        match task.due_date {
            Some(due) => {
                if due > today {
                    return false;
                }
            }
            None => return false,
        }
    } else {
        if filters.overdue && !task.due_date.is_some_and(|due| due < today) {
            return false;
        }
        if filters.today && task.due_date != Some(today) {
            return false;
        }
    }

    if let Some(pattern) = &filters.file_pattern {
        let path = task.file_path.to_string_lossy().to_lowercase();
        if !path.contains(&pattern.to_lowercase()) {
            return false;
        }
    }

    true
}

pub fn sort_tasks(tasks: &mut [Task], sort_by: Option<SortBy>) {
    match sort_by {
        Some(SortBy::Priority) => tasks.sort_by(|a, b| {
            detect_priority(&a.text)
                .cmp(&detect_priority(&b.text))
                .then_with(|| due_date_order(a, b))
                .then_with(|| a.file_path.cmp(&b.file_path))
        }),
        Some(SortBy::File) => tasks.sort_by(|a, b| a.file_path.cmp(&b.file_path)),
        Some(SortBy::Due) | None => {
            tasks.sort_by(|a, b| due_date_order(a, b).then_with(|| a.file_path.cmp(&b.file_path)))
        }
    }
}

/// Ascending by due date, tasks without one sorted last.
fn due_date_order(a: &Task, b: &Task) -> std::cmp::Ordering {
    match (a.due_date, b.due_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Summary buckets for the overview display. Urgent/Overdue/Today/Other
/// partition the input priority-first (a high-priority overdue task counts
/// only as urgent); the heuristic buckets below them overlap freely.
#[derive(Debug, Default)]
pub struct TaskStats {
    pub total: usize,
    pub urgent: Vec<Task>,
    pub today: Vec<Task>,
    pub overdue: Vec<Task>,
    pub other: Vec<Task>,
    pub quick_wins: Vec<Task>,
    pub energy_needed: Vec<Task>,
    pub blocked: Vec<Task>,
}

impl TaskStats {
    pub fn analyze(tasks: &[Task], today: NaiveDate) -> TaskStats {
        let mut stats = TaskStats {
            total: tasks.len(),
            ..TaskStats::default()
        };

        for task in tasks {
            let lower = task.text.to_lowercase();

            if detect_priority(&task.text) == Priority::High {
                stats.urgent.push(task.clone());
            } else {
                match task.due_date {
                    Some(due) if due < today => stats.overdue.push(task.clone()),
                    Some(due) if due == today => stats.today.push(task.clone()),
                    _ => stats.other.push(task.clone()),
                }
            }

            if QUICK_KEYWORDS.iter().any(|k| lower.contains(k))
                || (lower.contains("update") && task.text.len() < 30)
            {
                stats.quick_wins.push(task.clone());
            } else if ENERGY_KEYWORDS.iter().any(|k| lower.contains(k)) {
                stats.energy_needed.push(task.clone());
            }

            if BLOCKED_KEYWORDS.iter().any(|k| lower.contains(k)) {
                stats.blocked.push(task.clone());
            }
        }

        stats
    }
}

/// Rough effort estimate from the task text, used when no `est:` token is
/// present.
pub fn estimate_effort(text: &str) -> &'static str {
    let lower = text.to_lowercase();

    const QUICK: &[&str] = &["fix typo", "update", "change", "quick", "simple", "easy"];
    const LARGE: &[&str] = &["implement", "design", "refactor", "architecture", "migrate"];
    const MEDIUM: &[&str] = &["add", "create", "write", "test", "review"];

    if QUICK.iter().any(|k| lower.contains(k)) && text.len() < 40 {
        "15m"
    } else if LARGE.iter().any(|k| lower.contains(k)) {
        "2-4h"
    } else if MEDIUM.iter().any(|k| lower.contains(k)) {
        "1h"
    } else if text.len() > 60 {
        "1-2h"
    } else {
        "30m"
    }
}
