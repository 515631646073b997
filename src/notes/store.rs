use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use super::{
    scan::is_note_file,
    template::{self, NoteType},
};

/// Directories `init` lays down under the notes root.
pub const INIT_DIRS: &[&str] = &[
    "daily",
    "projects",
    "meetings",
    "design",
    "learning",
    "todos",
    "archive",
    "templates",
];

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} notes require a title")]
    TitleRequired(NoteType),
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Default)]
pub struct InitSummary {
    pub created_dirs: Vec<String>,
    pub readme_created: bool,
    pub templates_created: Vec<String>,
    pub gitignore_created: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

/// Lowercases and joins every alphanumeric run with single dashes.
pub fn kebab_case(s: &str) -> String {
    NON_ALNUM
        .replace_all(s, "-")
        .to_lowercase()
        .trim_matches('-')
        .to_string()
}

/// Creates the folder structure, README, per-type template stubs and
/// `.gitignore`. Existing files are left alone, so re-running is safe.
pub async fn init_workspace(root: &Path) -> Result<InitSummary, StoreError> {
    let mut summary = InitSummary::default();

    for dir in INIT_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            summary.created_dirs.push(dir.to_string());
        }
        fs::create_dir_all(&path)
            .await
            .map_err(|source| StoreError::Write { path, source })?;
    }

    summary.readme_created = write_if_absent(&root.join("README.md"), README).await?;

    for note_type in [
        NoteType::Daily,
        NoteType::Project,
        NoteType::Meeting,
        NoteType::Design,
        NoteType::Learning,
    ] {
        let name = format!("{note_type}.md");
        let content = format!("# {name}\n\nThis is a template for {note_type} notes.\n");
        if write_if_absent(&root.join("templates").join(&name), &content).await? {
            summary.templates_created.push(name);
        }
    }

    summary.gitignore_created = write_if_absent(&root.join(".gitignore"), GITIGNORE).await?;

    Ok(summary)
}

async fn write_if_absent(path: &Path, content: &str) -> Result<bool, StoreError> {
    if path.exists() {
        debug!("already present, leaving alone: {}", path.display());
        return Ok(false);
    }
    fs::write(path, content).await.map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Filename for a new note. Daily notes are date-keyed so the title is
/// ignored; all other types require one.
pub fn note_filename(note_type: NoteType, title: &str, date: NaiveDate) -> Result<String, StoreError> {
    if note_type != NoteType::Daily && title.trim().is_empty() {
        return Err(StoreError::TitleRequired(note_type));
    }
    let date = date.format("%Y-%m-%d");
    Ok(match note_type {
        NoteType::Daily => format!("{date}.md"),
        NoteType::Meeting => format!("{date}-{}.md", kebab_case(title)),
        NoteType::Project | NoteType::Design | NoteType::Learning => {
            format!("{}.md", kebab_case(title))
        }
    })
}

/// Renders the template into a new note file. An existing note is
/// reported, never overwritten.
pub async fn create_note(
    root: &Path,
    note_type: NoteType,
    title: &str,
    date: NaiveDate,
) -> Result<CreateOutcome, StoreError> {
    let dir = root.join(note_type.directory());
    let path = dir.join(note_filename(note_type, title, date)?);

    if path.exists() {
        return Ok(CreateOutcome::AlreadyExists(path));
    }

    fs::create_dir_all(&dir)
        .await
        .map_err(|source| StoreError::Write { path: dir, source })?;
    let content = template::render(note_type, title, date);
    fs::write(&path, content)
        .await
        .map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(CreateOutcome::Created(path))
}

#[derive(Debug)]
pub struct NoteListing {
    pub dir: &'static str,
    pub files: Vec<String>,
}

/// Note files per type directory, sorted by name. Empty and missing
/// directories are omitted.
pub async fn list_notes(root: &Path) -> Vec<NoteListing> {
    let mut listings = Vec::new();

    for dir in ["daily", "projects", "meetings", "design", "learning"] {
        let Ok(mut entries) = fs::read_dir(root.join(dir)).await else {
            continue;
        };

        let mut files = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_file() && is_note_file(&path) {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        if files.is_empty() {
            continue;
        }
        files.sort();
        listings.push(NoteListing { dir, files });
    }

    listings
}

const README: &str = "\
# Notes

Organized note-taking system with templates and folder structure.

## Usage

```bash
notedown init                          # Initialize folder structure
notedown create daily                  # Create today's daily note
notedown create project \"Feature Name\" # Create project documentation
notedown create meeting \"Team Standup\" # Create meeting notes
notedown create design \"API Design\"    # Create design document
notedown create learning \"New Topic\"   # Create learning notes
notedown list                          # List all notes
notedown tasks                         # Show incomplete tasks
```

## Structure

- `daily/` - Daily notes (date-based)
- `projects/` - Project documentation
- `meetings/` - Meeting notes
- `design/` - Technical design documents
- `learning/` - Learning notes and tutorials
- `todos/` - Task management
- `templates/` - Note templates
- `archive/` - Completed/old items

## Templates

Each note type uses a structured template to maintain consistency:

- **Daily**: Tasks, notes, follow-ups
- **Project**: Overview, goals, status, actions, decisions
- **Meeting**: Agenda, discussion, decisions, action items
- **Design**: Problem statement, solutions, implementation plan
- **Learning**: Key concepts, examples, code, insights
";

const GITIGNORE: &str = "\
# OS generated files
.DS_Store
.DS_Store?
._*
.Spotlight-V100
.Trashes
ehthumbs.db
Thumbs.db

# Editor files
.vscode/
.idea/
*.swp
*.swo
*~

# Temporary files
*.tmp
*.temp

# Tooling state
.logs/
.timer_state.json
";

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn kebab_case_collapses_punctuation_runs() {
        assert_eq!(kebab_case("API Design: v2!"), "api-design-v2");
        assert_eq!(kebab_case("  spaced  out  "), "spaced-out");
        assert_eq!(kebab_case("already-kebab"), "already-kebab");
    }

    #[test]
    fn filenames_follow_the_type_convention() -> Result<()> {
        assert_eq!(note_filename(NoteType::Daily, "", date())?, "2024-01-15.md");
        assert_eq!(
            note_filename(NoteType::Meeting, "Team Standup", date())?,
            "2024-01-15-team-standup.md"
        );
        assert_eq!(
            note_filename(NoteType::Project, "Auth Rework", date())?,
            "auth-rework.md"
        );
        Ok(())
    }

    #[test]
    fn title_is_required_for_non_daily_types() {
        assert!(matches!(
            note_filename(NoteType::Project, "  ", date()),
            Err(StoreError::TitleRequired(NoteType::Project))
        ));
        assert!(note_filename(NoteType::Daily, "", date()).is_ok());
    }

    #[tokio::test]
    async fn init_lays_down_the_full_structure() -> Result<()> {
        let dir = tempdir()?;
        let summary = init_workspace(dir.path()).await?;

        assert_eq!(summary.created_dirs.len(), INIT_DIRS.len());
        assert!(summary.readme_created);
        assert!(summary.gitignore_created);
        assert_eq!(summary.templates_created.len(), 5);
        assert!(dir.path().join("templates/daily.md").exists());

        // Re-running reports nothing new and changes nothing.
        let again = init_workspace(dir.path()).await?;
        assert!(again.created_dirs.is_empty());
        assert!(!again.readme_created);
        assert!(again.templates_created.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn create_renders_template_and_never_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let outcome = create_note(dir.path(), NoteType::Project, "Auth Rework", date()).await?;
        let CreateOutcome::Created(path) = outcome else {
            panic!("expected a new note");
        };
        let content = fs::read_to_string(&path).await?;
        assert!(content.starts_with("# Auth Rework\n"));

        fs::write(&path, "edited").await?;
        let outcome = create_note(dir.path(), NoteType::Project, "Auth Rework", date()).await?;
        assert_eq!(outcome, CreateOutcome::AlreadyExists(path.clone()));
        assert_eq!(fs::read_to_string(&path).await?, "edited");
        Ok(())
    }

    #[tokio::test]
    async fn list_groups_notes_per_directory() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("daily")).await?;
        fs::create_dir_all(dir.path().join("projects")).await?;
        fs::write(dir.path().join("daily/2024-01-16.md"), "").await?;
        fs::write(dir.path().join("daily/2024-01-15.md"), "").await?;
        fs::write(dir.path().join("daily/notes.pdf"), "").await?;

        let listings = list_notes(dir.path()).await;
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].dir, "daily");
        assert_eq!(listings[0].files, vec!["2024-01-15.md", "2024-01-16.md"]);
        Ok(())
    }
}
