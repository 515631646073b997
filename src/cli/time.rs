use std::path::Path;

use anyhow::Result;
use ansi_term::Colour;
use chrono::Local;
use clap::Subcommand;
use tracing::warn;

use crate::{
    notes::{
        report::{collect_time_data, Period, ReportData},
        scan::{resolve_task, scan_tasks},
    },
    timer::{DefaultTimer, Started, Stopped, TimerError, TimerStatus},
    utils::duration::format_duration,
};

use super::output::{bold, dim, header, pluralize, rel_path, rule, truncate};

#[derive(Subcommand, Debug)]
pub enum TimeCommand {
    #[command(about = "Start timing a task (matched against your notes)")]
    Start {
        #[arg(required = true, num_args = 1.., help = "Task text to search for")]
        task: Vec<String>,
    },
    #[command(about = "Pause the running timer")]
    Pause,
    #[command(about = "Resume a paused timer, or start one for the given task")]
    Resume {
        #[arg(num_args = 0.., help = "Task text to search for when nothing is paused")]
        task: Vec<String>,
    },
    #[command(about = "Stop the timer and log the session to the task's file")]
    Stop,
    #[command(about = "Show the current timer")]
    Status,
    #[command(about = "Summarize logged time")]
    Report {
        #[arg(default_value_t = Period::Today)]
        period: Period,
    },
}

pub async fn run_time(root: &Path, command: TimeCommand) -> Result<()> {
    let timer = DefaultTimer::new(root);

    match command {
        TimeCommand::Start { task } => start(root, &timer, &task.join(" ")).await,
        TimeCommand::Pause => {
            let paused = timer.pause().await?;
            println!("⏸️  Paused timer for: {}", bold(&paused.task_text));
            println!(
                "{}",
                dim(&format!("Elapsed time: {}", format_duration(paused.elapsed)))
            );
            Ok(())
        }
        TimeCommand::Resume { task } => resume(root, &timer, &task.join(" ")).await,
        TimeCommand::Stop => {
            let stopped = timer.stop().await?;
            print_stopped(&stopped);
            Ok(())
        }
        TimeCommand::Status => status(root, &timer).await,
        TimeCommand::Report { period } => {
            let report = collect_time_data(root, period, Local::now()).await;
            print_report(root, &report);
            Ok(())
        }
    }
}

async fn start(root: &Path, timer: &DefaultTimer, search: &str) -> Result<()> {
    let outcome = scan_tasks(root).await;
    for path in &outcome.skipped {
        warn!("could not scan {}", path.display());
    }
    let task = resolve_task(&outcome.tasks, search)
        .ok_or_else(|| TimerError::TaskNotFound(search.to_string()))?;

    let started = timer.start(task).await?;
    print_started(root, &started);
    Ok(())
}

async fn resume(root: &Path, timer: &DefaultTimer, search: &str) -> Result<()> {
    match timer.resume().await {
        Ok(resumed) => {
            println!("▶️  Resumed timer for: {}", bold(&resumed.task_text));
            Ok(())
        }
        // Nothing to resume: fall back to starting a fresh timer.
        Err(TimerError::NoActiveTimer) if !search.is_empty() => start(root, timer, search).await,
        Err(TimerError::NoActiveTimer) => Err(TimerError::NothingToResume.into()),
        Err(e) => Err(e.into()),
    }
}

async fn status(root: &Path, timer: &DefaultTimer) -> Result<()> {
    let (label, state, elapsed) = match timer.status().await? {
        TimerStatus::Idle => {
            println!("{}", dim("No active timer"));
            return Ok(());
        }
        TimerStatus::Running { state, elapsed } => ("🕐 RUNNING", state, elapsed),
        TimerStatus::Paused { state, elapsed } => ("⏸️  PAUSED", state, elapsed),
    };

    println!("{label}: {}", bold(&state.task_text));
    println!(
        "{}",
        dim(&format!(
            "Elapsed: {} • Location: {}:L{}",
            format_duration(elapsed),
            rel_path(root, &state.file_path),
            state.task_line
        ))
    );
    Ok(())
}

fn print_started(root: &Path, started: &Started) {
    if let Some(prior) = &started.prior_stop {
        match prior {
            Ok(stopped) => print_stopped(stopped),
            Err(e) => {
                warn!("implicit stop failed: {e}");
                println!("⚠ Warning: Could not log previous timer: {e}");
            }
        }
    }

    println!("⏰ Started timer for: {}", bold(&started.task_text));
    println!(
        "{}",
        dim(&format!(
            "Location: {}:L{}",
            rel_path(root, &started.file_path),
            started.task_line
        ))
    );
}

fn print_stopped(stopped: &Stopped) {
    println!("⏹️  Stopped timer for: {}", bold(&stopped.task_text));
    println!(
        "{}",
        Colour::Green.paint(format!("Time logged: {}", format_duration(stopped.elapsed)))
    );
}

fn print_report(root: &Path, report: &ReportData) {
    let title = match report.period {
        Period::Today => "Today",
        Period::Week => "This Week",
        Period::Month => "This Month",
    };
    println!("{}", header(&format!("⏰ Time Report - {title}")));
    println!(
        "{}",
        dim(&format!(
            "{} to {}",
            report.start.format("%b %-d"),
            report.end.pred_opt().unwrap_or(report.end).format("%b %-d, %Y")
        ))
    );
    println!("{}\n", rule(60));

    for path in &report.skipped {
        println!("{}", dim(&format!("⚠ Skipped unreadable: {}", path.display())));
    }

    if report.tasks.is_empty() {
        println!("{}", dim("No time tracked for this period."));
        return;
    }

    println!(
        "{} across {} task{}\n",
        bold(&format!("Total Time: {}", format_duration(report.total))),
        report.tasks.len(),
        pluralize(report.tasks.len())
    );

    println!("{}", bold("Task Breakdown:"));
    for (i, task_time) in report.tasks.iter().enumerate() {
        let percentage = if report.total.num_seconds() > 0 {
            task_time.total.num_seconds() as f64 / report.total.num_seconds() as f64 * 100.0
        } else {
            0.0
        };

        println!(
            "\n[{}] {} {}",
            i + 1,
            bold(&truncate(&task_time.task.text, 50)),
            dim(&format!(
                "({}, {percentage:.1}%)",
                format_duration(task_time.total)
            )),
        );
        println!(
            "    {}",
            dim(&format!(
                "📄 {}:L{}",
                rel_path(root, &task_time.task.file_path),
                task_time.task.line
            ))
        );

        if task_time.entries.len() > 1 {
            println!("    {}", dim("Sessions:"));
        }
        for entry in &task_time.entries {
            println!(
                "    • {} {}-{} ({}) - {}",
                entry.date.format("%b %-d"),
                entry.start.format("%H:%M"),
                entry.end.format("%H:%M"),
                format_duration(entry.duration),
                entry.description
            );
        }
    }

    if matches!(report.period, Period::Week | Period::Month) {
        println!("\n{}", bold("Daily Breakdown:"));
        for (date, total) in report.daily_totals() {
            println!("  {}: {}", date.format("%a %b %-d"), format_duration(total));
        }
    }

    println!("\n{}", rule(60));
    println!(
        "{}",
        dim(&format!(
            "Average per day: {}",
            format_duration(report.daily_average())
        ))
    );
}
