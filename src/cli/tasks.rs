use std::path::Path;

use anyhow::Result;
use ansi_term::Colour;
use chrono::{DateTime, Local};
use clap::Args;

use crate::notes::{
    filter::{
        detect_priority, estimate_effort, filter_tasks, sort_tasks, Priority, SortBy, TaskFilters,
        TaskStats,
    },
    scan::scan_tasks,
    task::Task,
};
use crate::utils::duration::{format_duration, parse_duration};

use super::output::{
    bold, dim, header, pluralize, priority_marker, priority_style, rel_path, relative_due, rule,
    truncate,
};

#[derive(Args, Debug, Default)]
pub struct TasksCommand {
    #[arg(long, help = "Show every incomplete task")]
    all: bool,
    #[arg(long, help = "Only overdue and today's tasks")]
    focus: bool,
    #[arg(long, help = "Only overdue tasks")]
    overdue: bool,
    #[arg(long, help = "Only tasks due today")]
    today: bool,
    #[arg(long = "tag", help = "Require a #tag (repeatable)")]
    tags: Vec<String>,
    #[arg(long, value_enum, help = "Filter by detected priority")]
    priority: Option<Priority>,
    #[arg(long = "file", help = "Only tasks from files matching this substring")]
    file_pattern: Option<String>,
    #[arg(long, value_enum, help = "Sort order")]
    sort: Option<SortBy>,
    #[arg(long, help = "Condensed category overview")]
    summary: bool,
    #[arg(long, help = "Detailed per-file view")]
    full: bool,
}

impl TasksCommand {
    fn has_explicit_filter(&self) -> bool {
        self.all
            || self.focus
            || self.overdue
            || self.today
            || !self.tags.is_empty()
            || self.priority.is_some()
            || self.file_pattern.is_some()
            || self.summary
            || self.full
    }
}

pub async fn run_tasks(root: &Path, mut command: TasksCommand) -> Result<()> {
    let now = Local::now();

    if !command.has_explicit_filter() {
        // Inside a watched subdirectory the directory itself is the filter,
        // otherwise fall back to focus mode.
        if let Some(context) = current_context(root) {
            println!("{}", header(&format!("📋 Tasks in {context}/")));
            command.file_pattern = Some(context);
        } else {
            command.focus = true;
            println!("{}", header("📋 Focus: Overdue & Today's Tasks"));
        }
    } else if command.summary {
        println!("{}", header("📊 Task Overview"));
    } else if command.focus {
        println!("{}", header("📋 Focus: Overdue & Today's Tasks"));
    } else {
        println!("{}", header("📋 All Incomplete Tasks"));
    }
    println!("{}\n", rule(50));

    let outcome = scan_tasks(root).await;
    for path in &outcome.skipped {
        println!("{}", dim(&format!("⚠ Skipped unreadable: {}", path.display())));
    }

    let mut filters = TaskFilters {
        tags: command.tags.clone(),
        priority: command.priority,
        overdue: command.overdue,
        today: command.today,
        file_pattern: command.file_pattern.clone(),
        sort_by: command.sort,
    };
    if command.focus {
        filters.overdue = true;
        filters.today = true;
    }

    let total_found = outcome.tasks.len();
    let mut tasks = filter_tasks(outcome.tasks, &filters, now.date_naive());

    if tasks.is_empty() {
        if total_found == 0 {
            println!("{}", Colour::Green.bold().paint("✅ No incomplete tasks found!"));
            println!("{}", dim("You're all caught up! 🎉"));
        } else {
            println!("{}", Colour::Yellow.bold().paint("⚠ No tasks match your filters"));
            println!("{}", dim("Try adjusting your filter criteria"));
        }
        return Ok(());
    }

    if command.summary {
        return show_summary(root, &tasks, now);
    }

    sort_tasks(&mut tasks, filters.sort_by);
    show_category_counts(&tasks, now);
    show_task_list(root, &tasks, now);
    Ok(())
}

/// The first path component of the working directory relative to the
/// notes root, when the invocation happens inside it.
fn current_context(root: &Path) -> Option<String> {
    let cwd = std::env::current_dir().ok()?;
    let rel = cwd.strip_prefix(root).ok()?;
    let first = rel.components().next()?;
    Some(first.as_os_str().to_string_lossy().into_owned())
}

fn show_category_counts(tasks: &[Task], now: DateTime<Local>) {
    let stats = TaskStats::analyze(tasks, now.date_naive());
    if stats.urgent.is_empty() && stats.today.is_empty() && stats.overdue.is_empty() {
        return;
    }
    println!(
        "🔥 {}     📅 {}     ⏰ {}     📋 {}",
        Colour::Red.bold().paint(format!("URGENT ({})", stats.urgent.len())),
        Colour::Yellow.bold().paint(format!("TODAY ({})", stats.today.len())),
        Colour::Red.bold().paint(format!("OVERDUE ({})", stats.overdue.len())),
        dim(&format!("OTHER ({})", stats.other.len())),
    );
    println!("{}\n", rule(65));
}

fn show_task_list(root: &Path, tasks: &[Task], now: DateTime<Local>) {
    let today = now.date_naive();
    let mut current_file = String::new();
    let mut overdue_count = 0;
    let mut today_count = 0;

    for task in tasks {
        let rel = rel_path(root, &task.file_path);
        if rel != current_file {
            if !current_file.is_empty() {
                println!();
            }
            println!("📝 {}", Colour::Blue.bold().paint(rel.as_str()));
            current_file = rel;
        }

        let priority = detect_priority(&task.text);
        let indent = "  ".repeat(task.indent / 2);
        let tree = if task.indent > 0 { "└─" } else { "├─" };

        let mut display = task.text.clone();
        if !task.tags.is_empty() {
            display = format!("{display} {}", Colour::Cyan.paint(task.tags.join(" ")));
        }
        let display = truncate(&display, 60);

        let due_str = match task.due_date {
            Some(due) if due < today => {
                overdue_count += 1;
                format!(" {}", Colour::Red.bold().paint(format!("({})", relative_due(due, today))))
            }
            Some(due) if due == today => {
                today_count += 1;
                format!(
                    " {}",
                    Colour::Yellow.bold().paint(format!("(due {})", relative_due(due, today)))
                )
            }
            Some(due) => format!(" {}", dim(&format!("(due {})", relative_due(due, today)))),
            None => String::new(),
        };

        let estimate = task
            .estimate
            .clone()
            .unwrap_or_else(|| estimate_effort(&task.text).to_string());

        println!(
            "  {indent}{tree} {} {display}{due_str}{} {}",
            priority_style(priority).paint(priority_marker(priority)),
            time_info(task),
            dim(&format!("~{estimate} (L{})", task.line)),
        );
    }

    println!("\n{}", rule(50));
    let mut footer = format!("Total: {} task{}", tasks.len(), pluralize(tasks.len()));
    if overdue_count > 0 {
        footer.push_str(&format!(
            " {}",
            Colour::Red.bold().paint(format!("({overdue_count} overdue)"))
        ));
    }
    if today_count > 0 {
        footer.push_str(&format!(
            " {}",
            Colour::Yellow.bold().paint(format!("({today_count} due today)"))
        ));
    }
    println!("{}", bold(&footer));
}

/// Progress annotation from logged time against the task's own
/// Remaining/estimate markers.
fn time_info(task: &Task) -> String {
    if task.total_time.num_minutes() <= 0 {
        return String::new();
    }
    let total = format_duration(task.total_time);

    let text = match (&task.remaining, &task.estimate) {
        (Some(remaining), _) => format!("[{total} worked, {remaining} left]"),
        (None, Some(estimate)) => match parse_duration(estimate) {
            Ok(estimated) if task.total_time >= estimated => {
                return format!(" {}", Colour::Green.paint(format!("[{total} completed]")));
            }
            Ok(estimated) => format!("[{total}/{}]", format_duration(estimated)),
            Err(_) => format!("[{total} worked]"),
        },
        (None, None) => format!("[{total} worked]"),
    };
    format!(" {}", Colour::Yellow.paint(text))
}

fn show_summary(root: &Path, tasks: &[Task], now: DateTime<Local>) -> Result<()> {
    let today = now.date_naive();
    let stats = TaskStats::analyze(tasks, today);

    println!(
        "🔥 {}     📅 {}     ⏰ {}     📋 {}",
        Colour::Red.bold().paint(format!("URGENT ({})", stats.urgent.len())),
        Colour::Yellow.bold().paint(format!("TODAY ({})", stats.today.len())),
        Colour::Red.bold().paint(format!("OVERDUE ({})", stats.overdue.len())),
        dim(&format!("OTHER ({})", stats.other.len())),
    );
    println!("{}\n", rule(65));

    if !stats.quick_wins.is_empty() {
        println!("💡 Quick wins available ({} tasks <30min)", stats.quick_wins.len());
    }
    if !stats.energy_needed.is_empty() {
        println!(
            "⚡ Energy needed ({} complex tasks requiring focus)",
            stats.energy_needed.len()
        );
    }
    if !stats.blocked.is_empty() {
        println!("🤝 Waiting on others ({} blocked tasks)", stats.blocked.len());
    }
    if !stats.quick_wins.is_empty() || !stats.energy_needed.is_empty() || !stats.blocked.is_empty()
    {
        println!();
    }

    let critical: Vec<&Task> = stats
        .urgent
        .iter()
        .chain(stats.overdue.iter())
        .chain(stats.today.iter())
        .take(5)
        .collect();

    if !critical.is_empty() {
        println!("{}", bold("Top Critical Tasks:"));
        for (i, task) in critical.iter().enumerate() {
            let priority = detect_priority(&task.text);
            let due_str = task
                .due_date
                .map(|due| format!(" {}", dim(&format!("({})", relative_due(due, today)))))
                .unwrap_or_default();

            println!(
                "[{}] {} {}{due_str} {}",
                i + 1,
                priority_style(priority).paint(priority_marker(priority)),
                truncate(&task.text, 50),
                dim(&format!(
                    "~{} • {}:L{}",
                    estimate_effort(&task.text),
                    rel_path(root, &task.file_path),
                    task.line
                )),
            );
        }
    }

    println!("\n{}", rule(50));
    println!(
        "{}",
        bold(&format!("Total: {} task{}", stats.total, pluralize(stats.total)))
    );
    println!("{}", dim("Use --full to see detailed view"));
    Ok(())
}
