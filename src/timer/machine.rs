use std::path::{Path, PathBuf};

use chrono::Duration;
use thiserror::Error;

use crate::{
    notes::{
        task::Task,
        timelog::{MarkdownTimeLog, TimeLog, TimeLogError},
    },
    utils::clock::{Clock, SystemClock},
};

use super::state::{JsonStateStore, StateStore, StateStoreError, TimerState};

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("no task found matching: {0}")]
    TaskNotFound(String),
    #[error("no active timer found")]
    NoActiveTimer,
    #[error("timer is already paused")]
    AlreadyPaused,
    #[error("timer is not paused")]
    NotPaused,
    #[error("no paused timer found and no task specified")]
    NothingToResume,
    #[error(transparent)]
    Store(#[from] StateStoreError),
    #[error("failed to add time entry")]
    Log(#[from] TimeLogError),
}

/// Read-only view of the persisted timer.
#[derive(Debug)]
pub enum TimerStatus {
    Idle,
    Running { state: TimerState, elapsed: Duration },
    /// Elapsed is frozen at the moment of the pause.
    Paused { state: TimerState, elapsed: Duration },
}

#[derive(Debug)]
pub struct Started {
    pub task_text: String,
    pub file_path: PathBuf,
    pub task_line: usize,
    /// Outcome of implicitly stopping a timer that was already running.
    /// Surfaced instead of swallowed so the caller can warn on failure;
    /// the new timer starts either way.
    pub prior_stop: Option<Result<Stopped, TimerError>>,
}

#[derive(Debug)]
pub struct Stopped {
    pub task_text: String,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct Paused {
    pub task_text: String,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct Resumed {
    pub task_text: String,
}

/// The single system-wide timer. Persistence, time source and the
/// markdown writer are injected ports, so every transition is testable
/// without real files or a real clock.
pub struct Timer<S, C, L> {
    store: S,
    clock: C,
    log: L,
}

pub type DefaultTimer = Timer<JsonStateStore, SystemClock, MarkdownTimeLog>;

impl DefaultTimer {
    pub fn new(notes_root: &Path) -> Self {
        Timer {
            store: JsonStateStore::new(notes_root),
            clock: SystemClock,
            log: MarkdownTimeLog,
        }
    }
}

impl<S: StateStore, C: Clock, L: TimeLog> Timer<S, C, L> {
    pub fn with_ports(store: S, clock: C, log: L) -> Self {
        Timer { store, clock, log }
    }

    async fn active_state(&self) -> Result<Option<TimerState>, TimerError> {
        Ok(self.store.load().await?.filter(|s| s.is_active))
    }

    pub async fn status(&self) -> Result<TimerStatus, TimerError> {
        let Some(state) = self.active_state().await? else {
            return Ok(TimerStatus::Idle);
        };
        let elapsed = state.elapsed(self.clock.now());
        Ok(if state.is_paused {
            TimerStatus::Paused { state, elapsed }
        } else {
            TimerStatus::Running { state, elapsed }
        })
    }

    /// Starts timing `task`. A timer that is already running or paused is
    /// stopped (and its time logged) first; see [Started::prior_stop].
    pub async fn start(&self, task: &Task) -> Result<Started, TimerError> {
        let prior_stop = match self.active_state().await? {
            Some(_) => Some(self.stop().await),
            None => None,
        };

        let state = TimerState::running(
            task.text.clone(),
            task.file_path.clone(),
            task.line,
            self.clock.now(),
        );
        self.store.save(&state).await?;

        Ok(Started {
            task_text: state.task_text,
            file_path: state.file_path,
            task_line: state.task_line,
            prior_stop,
        })
    }

    pub async fn pause(&self) -> Result<Paused, TimerError> {
        let mut state = self.active_state().await?.ok_or(TimerError::NoActiveTimer)?;
        if state.is_paused {
            return Err(TimerError::AlreadyPaused);
        }

        let now = self.clock.now();
        state.is_paused = true;
        state.paused_at = Some(now);
        self.store.save(&state).await?;

        Ok(Paused {
            elapsed: state.elapsed(now),
            task_text: state.task_text,
        })
    }

    pub async fn resume(&self) -> Result<Resumed, TimerError> {
        let mut state = self.active_state().await?.ok_or(TimerError::NoActiveTimer)?;
        if !state.is_paused {
            return Err(TimerError::NotPaused);
        }

        if let Some(paused_at) = state.paused_at.take() {
            state.total_paused = state.total_paused + (self.clock.now() - paused_at);
        }
        state.is_paused = false;
        self.store.save(&state).await?;

        Ok(Resumed {
            task_text: state.task_text,
        })
    }

    /// Stops the timer and logs its elapsed time to the task's markdown
    /// file. The persisted state is cleared only after the write succeeds,
    /// so a write failure keeps the timer on disk.
    pub async fn stop(&self) -> Result<Stopped, TimerError> {
        let state = self.active_state().await?.ok_or(TimerError::NoActiveTimer)?;

        let elapsed = state.elapsed(self.clock.now());
        self.log
            .append(&state.file_path, state.task_line, state.start_time, elapsed)
            .await?;
        self.store.clear().await?;

        Ok(Stopped {
            task_text: state.task_text,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::Mutex,
    };

    use anyhow::Result;
    use chrono::{DateTime, Local, TimeZone};
    use mockall::predicate::{always, eq};
    use tempfile::tempdir;

    use crate::{
        notes::timelog::MockTimeLog,
        timer::state::MockStateStore,
        utils::logging::TEST_LOGGING,
    };

    use super::*;

    /// Deterministic clock handing out a scripted sequence of moments.
    struct StepClock(Mutex<VecDeque<DateTime<Local>>>);

    impl StepClock {
        fn new(moments: impl IntoIterator<Item = DateTime<Local>>) -> Self {
            Self(Mutex::new(moments.into_iter().collect()))
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Local> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .expect("test clock ran out of moments")
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    fn task(text: &str, line: usize) -> Task {
        Task::new(
            text.into(),
            line,
            0,
            Path::new("/notes/todos/a.md").to_path_buf(),
        )
    }

    #[tokio::test]
    async fn full_cycle_excludes_paused_time() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        // start 09:00, pause 09:30, resume 09:50, stop 10:00:
        // logged time must be 40m, independent of the 20m pause.
        let clock = StepClock::new([at(9, 0), at(9, 30), at(9, 50), at(10, 0)]);

        let mut log = MockTimeLog::new();
        log.expect_append()
            .with(always(), eq(3), eq(at(9, 0)), eq(Duration::minutes(40)))
            .once()
            .returning(|_, _, _, _| Ok(()));

        let timer = Timer::with_ports(JsonStateStore::new(dir.path()), clock, log);

        timer.start(&task("Fix auth bug", 3)).await?;
        let paused = timer.pause().await?;
        assert_eq!(paused.elapsed, Duration::minutes(30));
        timer.resume().await?;
        let stopped = timer.stop().await?;

        assert_eq!(stopped.elapsed, Duration::minutes(40));
        assert!(matches!(timer.status().await, Ok(TimerStatus::Idle)));
        Ok(())
    }

    #[tokio::test]
    async fn stopping_while_paused_excludes_the_open_pause() -> Result<()> {
        let dir = tempdir()?;
        // start 09:00, pause 09:30, stop 10:00 → only 30m are logged.
        let clock = StepClock::new([at(9, 0), at(9, 30), at(10, 0)]);

        let mut log = MockTimeLog::new();
        log.expect_append()
            .with(always(), always(), always(), eq(Duration::minutes(30)))
            .once()
            .returning(|_, _, _, _| Ok(()));

        let timer = Timer::with_ports(JsonStateStore::new(dir.path()), clock, log);
        timer.start(&task("Fix auth bug", 3)).await?;
        timer.pause().await?;
        let stopped = timer.stop().await?;
        assert_eq!(stopped.elapsed, Duration::minutes(30));
        Ok(())
    }

    #[tokio::test]
    async fn second_start_logs_and_clears_the_first() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        // start A 09:00, start B 10:00 (stops A at 10:00 first),
        // final status check at 10:30.
        let clock = StepClock::new([at(9, 0), at(10, 0), at(10, 0), at(10, 30)]);

        let mut log = MockTimeLog::new();
        log.expect_append()
            .with(always(), eq(3), eq(at(9, 0)), eq(Duration::hours(1)))
            .once()
            .returning(|_, _, _, _| Ok(()));

        let timer = Timer::with_ports(JsonStateStore::new(dir.path()), clock, log);
        timer.start(&task("First", 3)).await?;
        let started = timer.start(&task("Second", 7)).await?;

        let prior = started.prior_stop.expect("first timer was running");
        assert_eq!(prior.unwrap().elapsed, Duration::hours(1));

        match timer.status().await? {
            TimerStatus::Running { state, .. } => assert_eq!(state.task_text, "Second"),
            other => panic!("expected running timer, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_keeps_the_timer() -> Result<()> {
        let dir = tempdir()?;
        let clock = StepClock::new([at(9, 0), at(10, 0), at(10, 5)]);

        let mut log = MockTimeLog::new();
        log.expect_append()
            .returning(|_, _, _, _| Err(TimeLogError::LineOutOfRange { line: 3, len: 1 }));

        let timer = Timer::with_ports(JsonStateStore::new(dir.path()), clock, log);
        timer.start(&task("Fix auth bug", 3)).await?;
        assert!(timer.stop().await.is_err());

        // The state survives a failed write, so the timer is still there.
        assert!(matches!(
            timer.status().await?,
            TimerStatus::Running { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn store_failures_surface_as_timer_errors() {
        let mut store = MockStateStore::new();
        store.expect_load().returning(|| {
            Err(StateStoreError::Read(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            )))
        });
        let timer = Timer::with_ports(store, StepClock::new([]), MockTimeLog::new());
        assert!(matches!(timer.status().await, Err(TimerError::Store(_))));

        let mut store = MockStateStore::new();
        store.expect_load().returning(|| Ok(None));
        store.expect_save().returning(|_| {
            Err(StateStoreError::Write(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            )))
        });
        let timer = Timer::with_ports(store, StepClock::new([at(9, 0)]), MockTimeLog::new());
        assert!(matches!(
            timer.start(&task("Fix auth bug", 3)).await,
            Err(TimerError::Store(_))
        ));
    }

    #[tokio::test]
    async fn transition_errors_are_typed() -> Result<()> {
        let dir = tempdir()?;
        let clock = StepClock::new([at(9, 0), at(9, 10), at(9, 20)]);
        let timer = Timer::with_ports(JsonStateStore::new(dir.path()), clock, MockTimeLog::new());

        assert!(matches!(timer.pause().await, Err(TimerError::NoActiveTimer)));
        assert!(matches!(timer.stop().await, Err(TimerError::NoActiveTimer)));
        assert!(matches!(
            timer.resume().await,
            Err(TimerError::NoActiveTimer)
        ));

        timer.start(&task("Fix auth bug", 3)).await?;
        assert!(matches!(timer.resume().await, Err(TimerError::NotPaused)));
        timer.pause().await?;
        assert!(matches!(timer.pause().await, Err(TimerError::AlreadyPaused)));
        Ok(())
    }
}
