//! Thin async wrappers around the `git` binary. The notes root doubles
//! as the repository root.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::notes::scan::is_note_file;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    Modified,
    Added,
    Untracked,
}

/// A changed note file from `git status --porcelain`, path relative to
/// the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: PathBuf,
    pub state: ChangeState,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    CleanTree,
    Committed { message: String },
}

pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: &Path) -> Self {
        Git {
            root: root.to_path_buf(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .await?;
        if !output.status.success() {
            return Err(GitError::Failed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Initializes a repository at the notes root. Returns false when one
    /// already exists.
    pub async fn init_repo(&self) -> Result<bool, GitError> {
        if self.root.join(".git").exists() {
            return Ok(false);
        }
        self.run(&["init"]).await?;
        Ok(true)
    }

    pub async fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<(), GitError> {
        let mut args = vec!["add"];
        let rendered: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        args.extend(rendered.iter().map(String::as_str));
        self.run(&args).await?;
        self.run(&["commit", "-m", message]).await?;
        Ok(())
    }

    /// Stages and commits everything. A clean tree is a no-op.
    pub async fn save_all(&self, message: &str) -> Result<SaveOutcome, GitError> {
        if self.run(&["status", "--porcelain"]).await?.is_empty() {
            return Ok(SaveOutcome::CleanTree);
        }
        self.run(&["add", "."]).await?;
        self.run(&["commit", "-m", message]).await?;
        Ok(SaveOutcome::Committed {
            message: message.to_string(),
        })
    }

    /// Changed note files (`.md`/`.txt` only) from the porcelain status.
    pub async fn changed_notes(&self) -> Result<Vec<ChangedFile>, GitError> {
        let output = self.run(&["status", "--porcelain"]).await?;
        Ok(parse_porcelain(&output))
    }

    pub async fn diff_head(&self, path: &Path) -> Result<String, GitError> {
        let path = path.display().to_string();
        self.run(&["diff", "HEAD", "--", &path]).await
    }
}

fn parse_porcelain(output: &str) -> Vec<ChangedFile> {
    let mut changed = Vec::new();
    for line in output.lines() {
        if line.len() < 3 {
            continue;
        }
        let status = &line[..2];
        let path = Path::new(line[3..].trim());
        if !is_note_file(path) {
            continue;
        }

        let state = if status.contains('M') {
            ChangeState::Modified
        } else if status.contains('A') {
            ChangeState::Added
        } else if status.contains('?') {
            ChangeState::Untracked
        } else {
            continue;
        };
        changed.push(ChangedFile {
            path: path.to_path_buf(),
            state,
        });
    }
    changed
}
