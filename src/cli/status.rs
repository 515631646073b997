use std::{collections::HashSet, path::Path, sync::LazyLock};

use anyhow::Result;
use ansi_term::Colour;
use regex::Regex;
use tracing::warn;

use crate::{
    git::{ChangeState, ChangedFile, Git},
    notes::extract::extract_tasks,
};

use super::output::{bold, dim, header, pluralize, rule, truncate};

static TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*\[\s*([ xX]?)\s*\]\s*(.*)$").unwrap());
static DIFF_TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])\s*-\s*\[\s*([ xX]?)\s*\]\s*(.*)$").unwrap());

const SUMMARY_SCAN_LINES: usize = 20;

pub async fn run_status(root: &Path) -> Result<()> {
    println!("{}", header("📊 Notes Status"));
    println!("{}\n", rule(50));

    let git = Git::new(root);
    let changed = match git.changed_notes().await {
        Ok(changed) => changed,
        Err(e) => {
            warn!("git status failed: {e}");
            println!("{}", dim(&format!("Could not check git status: {e}")));
            return Ok(());
        }
    };

    show_changed_notes(root, &changed).await;
    show_changed_todos(root, &git, &changed).await;
    Ok(())
}

async fn show_changed_notes(root: &Path, changed: &[ChangedFile]) {
    if changed.is_empty() {
        println!("{}", Colour::Green.bold().paint("✅ No changed notes"));
        println!("{}\n", dim("All notes are up to date"));
        return;
    }

    println!("{}", bold(&format!("Changed Notes ({}):", changed.len())));

    for (state, label, marker, colour) in [
        (ChangeState::Modified, "Modified:", "📝", Colour::Yellow),
        (ChangeState::Added, "Added:", "📄", Colour::Green),
        (ChangeState::Untracked, "Untracked:", "📋", Colour::Cyan),
    ] {
        let mut files: Vec<&ChangedFile> = changed.iter().filter(|f| f.state == state).collect();
        if files.is_empty() {
            continue;
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        println!("  {}", colour.paint(label));
        for file in files {
            let summary = note_summary_for(root, &file.path).await;
            println!("    {marker} {}{summary}", file.path.display());
        }
    }
    println!();
}

async fn note_summary_for(root: &Path, rel: &Path) -> String {
    match tokio::fs::read_to_string(root.join(rel)).await {
        Ok(content) => note_summary(&content),
        Err(_) => String::new(),
    }
}

/// Brief parenthesized summary of a note: its title and how many
/// checkbox tasks sit in the first 20 lines.
fn note_summary(content: &str) -> String {
    let mut title = None;
    let mut task_count = 0;

    for line in content.lines().take(SUMMARY_SCAN_LINES) {
        if title.is_none() {
            let trimmed = line.trim();
            if let Some(heading) = trimmed.strip_prefix("# ") {
                title = Some(truncate(heading, 30));
            } else if trimmed.len() > 10 && !trimmed.starts_with("---") {
                title = Some(truncate(trimmed, 30));
            }
        }
        if TASK_LINE.is_match(line) {
            task_count += 1;
        }
    }

    let mut parts = Vec::new();
    if let Some(title) = title {
        parts.push(format!("\"{title}\""));
    }
    if task_count > 0 {
        parts.push(format!("{task_count} task{}", pluralize(task_count)));
    }
    if parts.is_empty() {
        return String::new();
    }
    format!(" {}", dim(&format!("({})", parts.join(", "))))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub new: Vec<String>,
    pub completed: Vec<String>,
    pub modified: Vec<String>,
}

async fn show_changed_todos(root: &Path, git: &Git, changed: &[ChangedFile]) {
    if changed.is_empty() {
        return;
    }

    println!("{}", bold("Todo Changes:"));

    let mut all = TodoChanges::default();
    for file in changed {
        let changes = match file.state {
            // Untracked files have no diff; every task in them is new.
            ChangeState::Untracked => untracked_todos(root, &file.path).await,
            _ => match git.diff_head(&file.path).await {
                Ok(diff) => analyze_todo_diff(&diff, &file.path),
                Err(e) => {
                    warn!("diff failed for {}: {e}", file.path.display());
                    TodoChanges::default()
                }
            },
        };
        all.new.extend(changes.new);
        all.completed.extend(changes.completed);
        all.modified.extend(changes.modified);
    }

    dedup(&mut all.new);
    dedup(&mut all.completed);
    dedup(&mut all.modified);

    if all.new.is_empty() && all.completed.is_empty() && all.modified.is_empty() {
        println!("  {}\n", dim("No todo changes in modified files"));
        return;
    }

    for (label, marker, items, colour) in [
        ("New todos", "+", &all.new, Colour::Green),
        ("Completed todos", "✓", &all.completed, Colour::Yellow),
        ("Modified todos", "~", &all.modified, Colour::Cyan),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("  {}", colour.paint(format!("{label} ({}):", items.len())));
        for item in items {
            println!("    {marker} {item}");
        }
        println!();
    }
}

async fn untracked_todos(root: &Path, rel: &Path) -> TodoChanges {
    let mut changes = TodoChanges::default();
    if let Ok(tasks) = extract_tasks(&root.join(rel)).await {
        for task in tasks {
            changes.new.push(format!(
                "{} {}",
                truncate(&task.text, 60),
                dim(&format!("({}:L{})", rel.display(), task.line))
            ));
        }
    }
    changes
}

/// Classifies checkbox lines in a `git diff HEAD` hunk: added unchecked
/// are new, added checked are completions, removed unchecked are
/// treated as modified.
fn analyze_todo_diff(diff: &str, rel: &Path) -> TodoChanges {
    let mut changes = TodoChanges::default();

    for line in diff.lines() {
        let Some(caps) = DIFF_TASK_LINE.captures(line) else {
            continue;
        };
        let completed = caps[2].trim().eq_ignore_ascii_case("x");
        let entry = format!(
            "{} {}",
            caps[3].trim(),
            dim(&format!("({})", rel.display()))
        );

        match (&caps[1], completed) {
            ("+", true) => changes.completed.push(entry),
            ("+", false) => changes.new.push(entry),
            ("-", false) => changes.modified.push(entry),
            ("-", true) => {}
            _ => {}
        }
    }

    changes
}

fn dedup(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}
