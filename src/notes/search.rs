use std::path::{Path, PathBuf};

use tracing::debug;

use super::{extract::TAG_TOKEN, scan::note_files};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub file_path: PathBuf,
    /// 1-based line number.
    pub line: usize,
    pub content: String,
    /// Tags found on the line, `#` prefix included.
    pub tags: Vec<String>,
}

/// Full-text search over the watched note directories. A line matches
/// when it contains `query` (case-insensitive, empty matches all) and
/// carries at least one of `tags` (none requested matches all).
pub async fn search_notes(notes_root: &Path, query: &str, tags: &[String]) -> Vec<SearchResult> {
    let query = query.to_lowercase();
    let mut results = Vec::new();

    let (files, _) = note_files(notes_root);
    for path in files {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("skipping unreadable file {}: {e}", path.display());
                continue;
            }
        };
        search_in_str(&content, &path, &query, tags, &mut results);
    }

    results
}

fn search_in_str(
    content: &str,
    path: &Path,
    query: &str,
    tags: &[String],
    results: &mut Vec<SearchResult>,
) {
    for (index, line) in content.lines().enumerate() {
        if !query.is_empty() && !line.to_lowercase().contains(query) {
            continue;
        }

        let line_tags: Vec<String> = TAG_TOKEN
            .captures_iter(line)
            .map(|c| format!("#{}", &c[1]))
            .collect();

        let tags_match = tags.is_empty()
            || tags
                .iter()
                .any(|wanted| line_tags.iter().any(|t| t.eq_ignore_ascii_case(wanted)));
        if !tags_match {
            continue;
        }

        results.push(SearchResult {
            file_path: path.to_path_buf(),
            line: index + 1,
            content: line.trim().to_string(),
            tags: line_tags,
        });
    }
}
