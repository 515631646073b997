pub mod notes;
pub mod output;
pub mod status;
pub mod tasks;
pub mod time;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    git::{Git, SaveOutcome},
    notes::template::NoteType,
    utils::logging::enable_logging,
};

use tasks::TasksCommand;
use time::TimeCommand;

#[derive(Parser, Debug)]
#[command(name = "Notedown", version, long_about = None)]
#[command(about = "Markdown notes with task extraction and time tracking", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Notes root directory. Defaults to the current directory")]
    dir: Option<PathBuf>,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Set up the notes folder structure and git repository")]
    Init,
    #[command(about = "Create a note from its type's template")]
    Create {
        #[arg(value_enum)]
        note_type: NoteType,
        #[arg(default_value = "")]
        title: String,
    },
    #[command(about = "List existing notes per directory")]
    List,
    #[command(about = "Show incomplete tasks across all notes")]
    Tasks {
        #[command(flatten)]
        command: TasksCommand,
    },
    #[command(about = "Full-text search across notes. Arguments starting with # are tag filters")]
    Search {
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },
    #[command(about = "Show changed notes and todo changes against git")]
    Status,
    #[command(about = "Commit all pending note changes")]
    Save {
        #[arg(num_args = 0.., help = "Commit message")]
        message: Vec<String>,
    },
    #[command(about = "Track time spent on tasks")]
    Time {
        #[command(subcommand)]
        command: TimeCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let root = match args.dir {
        Some(dir) => dir,
        None => env::current_dir()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&root, logging_level, args.log)?;

    match args.commands {
        Commands::Init => notes::run_init(&root).await,
        Commands::Create { note_type, title } => notes::run_create(&root, note_type, &title).await,
        Commands::List => notes::run_list(&root).await,
        Commands::Tasks { command } => tasks::run_tasks(&root, command).await,
        Commands::Search { terms } => {
            let (query, tags) = split_search_terms(&terms);
            notes::run_search(&root, &query, &tags).await
        }
        Commands::Status => status::run_status(&root).await,
        Commands::Save { message } => {
            let message = if message.is_empty() {
                "Update notes".to_string()
            } else {
                message.join(" ")
            };
            match Git::new(&root).save_all(&message).await? {
                SaveOutcome::CleanTree => println!("✅ No changes to commit"),
                SaveOutcome::Committed { message } => println!("✅ Changes committed: {message}"),
            }
            Ok(())
        }
        Commands::Time { command } => time::run_time(&root, command).await,
    }
}

/// Splits raw search arguments: `#`-prefixed terms are tag filters, the
/// rest joins into the query.
fn split_search_terms(terms: &[String]) -> (String, Vec<String>) {
    let mut query_parts = Vec::new();
    let mut tags = Vec::new();
    for term in terms {
        if term.starts_with('#') {
            tags.push(term.clone());
        } else {
            query_parts.push(term.as_str());
        }
    }
    (query_parts.join(" "), tags)
}
