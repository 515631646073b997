use std::path::Path;

use anyhow::Result;
use ansi_term::Colour;
use chrono::Local;
use tracing::warn;

use crate::{
    git::Git,
    notes::{
        search::search_notes,
        store::{self, CreateOutcome},
        template::NoteType,
    },
};

use super::output::{bold, dim, header, pluralize, rel_path, rule};

pub async fn run_init(root: &Path) -> Result<()> {
    println!("Initializing notes folder structure in: {}", root.display());

    let summary = store::init_workspace(root).await?;
    for dir in &summary.created_dirs {
        println!("✓ Created directory: {dir}/");
    }
    if summary.readme_created {
        println!("✓ Created README.md");
    }
    for template in &summary.templates_created {
        println!("✓ Created template: templates/{template}");
    }

    let git = Git::new(root);
    match git.init_repo().await {
        Ok(true) => {
            if let Err(e) = git
                .commit_paths(&[Path::new(".")], "Initial commit: Set up notes structure")
                .await
            {
                warn!("initial commit failed: {e}");
                println!("⚠ Warning: Failed to create initial commit: {e}");
            } else {
                println!("✓ Initialized git repository");
            }
        }
        Ok(false) => println!("✓ Git repository already exists"),
        Err(e) => {
            warn!("git init failed: {e}");
            println!("⚠ Warning: Failed to initialize git repository: {e}");
        }
    }

    println!("\n✅ Notes folder structure initialized!");
    Ok(())
}

pub async fn run_create(root: &Path, note_type: NoteType, title: &str) -> Result<()> {
    let date = Local::now().date_naive();

    match store::create_note(root, note_type, title, date).await? {
        CreateOutcome::AlreadyExists(path) => {
            println!("⚠ Note already exists: {}", path.display());
        }
        CreateOutcome::Created(path) => {
            println!("✅ Created new {note_type} note: {}", path.display());

            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let message = format!("Add {note_type} note: {filename}");
            if let Err(e) = Git::new(root).commit_paths(&[&path], &message).await {
                warn!("commit failed for {}: {e}", path.display());
                println!("⚠ Warning: Failed to commit note to git: {e}");
            }
        }
    }
    Ok(())
}

pub async fn run_list(root: &Path) -> Result<()> {
    println!("Existing notes:\n");

    for listing in store::list_notes(root).await {
        println!("📁 {}/", listing.dir);
        for file in &listing.files {
            println!("  {file}");
        }
        println!();
    }
    Ok(())
}

pub async fn run_search(root: &Path, query: &str, tags: &[String]) -> Result<()> {
    print!("🔍 {}", header(&format!("Search Results for: \"{query}\"")));
    if !tags.is_empty() {
        print!(" {}", Colour::Cyan.paint(tags.join(" ")));
    }
    println!("\n{}\n", rule(50));

    let results = search_notes(root, query, tags).await;
    if results.is_empty() {
        println!("{}", dim("No results found."));
        return Ok(());
    }

    let mut current_file = String::new();
    for result in &results {
        let rel = rel_path(root, &result.file_path);
        if rel != current_file {
            if !current_file.is_empty() {
                println!();
            }
            println!("📄 {}", Colour::Blue.bold().paint(rel.as_str()));
            current_file = rel;
        }

        let mut line = format!(
            "  {} {}",
            dim(&format!("L{}:", result.line)),
            super::output::truncate(&result.content, 100)
        );
        if !result.tags.is_empty() {
            line.push_str(&format!(" {}", Colour::Cyan.paint(result.tags.join(" "))));
        }
        println!("{line}");
    }

    println!("\n{}", rule(50));
    println!(
        "{}",
        bold(&format!(
            "Found {} result{}",
            results.len(),
            pluralize(results.len())
        ))
    );
    Ok(())
}
