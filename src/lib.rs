//! Markdown note-taking for the terminal: structured note folders with
//! templates, checkbox task extraction with due dates and tags, a
//! persistent task timer that logs sessions back into the notes, and
//! time reports on top of those logs.
//!

pub mod cli;
pub mod git;
pub mod notes;
pub mod timer;
pub mod utils;
