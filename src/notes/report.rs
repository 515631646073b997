use std::{collections::BTreeMap, fmt::Display, path::Path, str::FromStr};

use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDate};
use now::DateTimeNow;
use thiserror::Error;

use super::{
    scan::scan_tasks,
    task::{Task, TimeEntry},
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid period: {0:?}. Use 'today', 'week', or 'month'")]
pub struct InvalidPeriod(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Week,
    Month,
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            _ => Err(InvalidPeriod(s.to_string())),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Today => write!(f, "today"),
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
        }
    }
}

impl Period {
    /// Half-open `[start, end)` date window for this period around `now`.
    /// Weeks are ISO: they start Monday, and a Sunday belongs to the week
    /// that started six days earlier.
    pub fn window(self, now: DateTime<Local>) -> (NaiveDate, NaiveDate) {
        let today = now.date_naive();
        match self {
            Period::Today => (today, today + Days::new(1)),
            Period::Week => {
                let start = today - Days::new(today.weekday().num_days_from_monday() as u64);
                (start, start + Days::new(7))
            }
            Period::Month => {
                let start = now.beginning_of_month().date_naive();
                (start, start + chrono::Months::new(1))
            }
        }
    }
}

/// One task's share of a report: the entries that fell inside the window
/// and their sum.
#[derive(Debug)]
pub struct TaskTime {
    pub task: Task,
    pub entries: Vec<TimeEntry>,
    pub total: Duration,
}

#[derive(Debug)]
pub struct ReportData {
    pub period: Period,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    /// Sorted descending by per-task total.
    pub tasks: Vec<TaskTime>,
    pub total: Duration,
    /// Paths the scan could not read.
    pub skipped: Vec<std::path::PathBuf>,
}

impl ReportData {
    /// Durations bucketed by calendar day, for the week/month breakdown.
    pub fn daily_totals(&self) -> BTreeMap<NaiveDate, Duration> {
        let mut totals = BTreeMap::new();
        for task in &self.tasks {
            for entry in &task.entries {
                *totals.entry(entry.date).or_insert_with(Duration::zero) += entry.duration;
            }
        }
        totals
    }

    /// Arithmetic mean over the number of days in the window, not over
    /// days with activity.
    pub fn daily_average(&self) -> Duration {
        let days = (self.end - self.start).num_days().max(1);
        self.total / days as i32
    }
}

/// Scans the notes tree and aggregates time entries falling inside the
/// period window. Tasks with no surviving entry are excluded entirely.
pub async fn collect_time_data(
    root: &Path,
    period: Period,
    now: DateTime<Local>,
) -> ReportData {
    let outcome = scan_tasks(root).await;
    aggregate(outcome.tasks, outcome.skipped, period, now)
}

pub fn aggregate(
    tasks: Vec<Task>,
    skipped: Vec<std::path::PathBuf>,
    period: Period,
    now: DateTime<Local>,
) -> ReportData {
    let (start, end) = period.window(now);

    let mut report_tasks = Vec::new();
    let mut total = Duration::zero();

    for task in tasks {
        if task.time_entries.is_empty() {
            continue;
        }

        let entries: Vec<TimeEntry> = task
            .time_entries
            .iter()
            .filter(|e| e.date >= start && e.date < end)
            .cloned()
            .collect();
        if entries.is_empty() {
            continue;
        }

        let task_total = entries
            .iter()
            .fold(Duration::zero(), |acc, e| acc + e.duration);
        total += task_total;
        report_tasks.push(TaskTime {
            task,
            entries,
            total: task_total,
        });
    }

    report_tasks.sort_by(|a, b| b.total.cmp(&a.total));

    ReportData {
        period,
        start,
        end,
        tasks: report_tasks,
        total,
        skipped,
    }
}
