pub mod machine;
pub mod state;

pub use machine::{DefaultTimer, Started, Stopped, Timer, TimerError, TimerStatus};
pub use state::TimerState;
