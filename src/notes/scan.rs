use std::path::{Path, PathBuf};

use futures::{stream, StreamExt};

use super::{extract::extract_tasks, task::Task};

/// The directories scanned for tasks, in scan order. `templates` and
/// `archive` exist in the tree but are never scanned.
pub const SEARCH_DIRS: &[&str] = &["daily", "projects", "meetings", "design", "learning", "todos"];

const EXTRACT_CONCURRENCY: usize = 4;

/// Result of a best-effort tree scan: whatever could be read, plus the
/// paths that could not. A skipped path never aborts the scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub tasks: Vec<Task>,
    pub skipped: Vec<PathBuf>,
}

/// Collects every note file (`.md`/`.txt`) under the watched directories.
/// Entries are visited in lexical order so scan order is deterministic;
/// unreadable directories land in `skipped`. A watched directory that does
/// not exist yet is simply absent, not an error.
pub fn note_files(root: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for dir in SEARCH_DIRS {
        let dir_path = root.join(dir);
        if !dir_path.is_dir() {
            continue;
        }
        walk(&dir_path, &mut files, &mut skipped);
    }

    (files, skipped)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>, skipped: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(v) => v,
        Err(_) => {
            skipped.push(dir.to_path_buf());
            return;
        }
    };

    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, files, skipped);
        } else if is_note_file(&path) {
            files.push(path);
        }
    }
}

pub fn is_note_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("txt")
    )
}

/// Extracts tasks from every note file under `root`. Files are read through
/// a buffered stream; a file that fails to read is recorded and the scan
/// continues.
pub async fn scan_tasks(root: &Path) -> ScanOutcome {
    let (files, mut skipped) = note_files(root);

    let results: Vec<_> = stream::iter(files)
        .map(|path| async move {
            let result = extract_tasks(&path).await;
            (path, result)
        })
        .buffered(EXTRACT_CONCURRENCY)
        .collect()
        .await;

    let mut tasks = Vec::new();
    for (path, result) in results {
        match result {
            Ok(found) => tasks.extend(found),
            Err(_) => skipped.push(path),
        }
    }

    ScanOutcome { tasks, skipped }
}

/// Resolves a search string against extracted tasks: case-insensitive
/// substring match, an exact full-text match preferred, otherwise the
/// first match in scan order.
pub fn resolve_task<'a>(tasks: &'a [Task], search: &str) -> Option<&'a Task> {
    let needle = search.to_lowercase();
    let mut matches = tasks
        .iter()
        .filter(|t| t.text.to_lowercase().contains(&needle))
        .peekable();

    let first = *matches.peek()?;
    matches
        .find(|t| t.text.eq_ignore_ascii_case(search))
        .or(Some(first))
}
