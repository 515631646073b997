use chrono::{DateTime, Local};

/// Represents an entity responsible for providing the current moment across
/// the application. The timer takes it as a port so tests can drive time by
/// hand.
pub trait Clock: Sync + Send + 'static {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
