pub mod extract;
pub mod filter;
pub mod report;
pub mod scan;
pub mod search;
pub mod store;
pub mod task;
pub mod template;
pub mod timelog;

pub use task::{Task, TimeEntry};
pub use template::NoteType;
