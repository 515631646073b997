use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the sidecar file under the notes root.
pub const STATE_FILE: &str = ".timer_state.json";

/// Snapshot of the one system-wide timer, persisted as a single JSON
/// object. The task reference is captured at start and never re-resolved;
/// the schema is private to the tool, so save/load round-trip is the only
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_active: bool,
    pub task_text: String,
    pub file_path: PathBuf,
    pub task_line: usize,
    pub start_time: DateTime<Local>,
    pub is_paused: bool,
    pub paused_at: Option<DateTime<Local>>,
    #[serde(with = "duration_secs")]
    pub total_paused: Duration,
}

impl TimerState {
    pub fn running(
        task_text: String,
        file_path: PathBuf,
        task_line: usize,
        start_time: DateTime<Local>,
    ) -> Self {
        Self {
            is_active: true,
            task_text,
            file_path,
            task_line,
            start_time,
            is_paused: false,
            paused_at: None,
            total_paused: Duration::zero(),
        }
    }

    /// Worked time as of `now`: wall time minus accumulated pauses, minus
    /// the open pause interval when currently paused.
    pub fn elapsed(&self, now: DateTime<Local>) -> Duration {
        let mut elapsed = now - self.start_time - self.total_paused;
        if let Some(paused_at) = self.paused_at.filter(|_| self.is_paused) {
            elapsed = elapsed - (now - paused_at);
        }
        elapsed
    }
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::seconds(i64::deserialize(deserializer)?))
    }
}

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("failed to read timer state")]
    Read(#[source] std::io::Error),
    #[error("failed to write timer state")]
    Write(#[source] std::io::Error),
    #[error("failed to delete timer state")]
    Delete(#[source] std::io::Error),
    #[error("timer state is corrupted")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence port for the timer: one record, read/write/delete. Absence
/// of the record is the idle state, never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    async fn load(&self) -> Result<Option<TimerState>, StateStoreError>;
    async fn save(&self, state: &TimerState) -> Result<(), StateStoreError>;
    async fn clear(&self) -> Result<(), StateStoreError>;
}

/// The real store: a JSON sidecar file under the notes root, replaced
/// atomically on save.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(notes_root: &Path) -> Self {
        Self {
            path: notes_root.join(STATE_FILE),
        }
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<Option<TimerState>, StateStoreError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateStoreError::Read(e)),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    async fn save(&self, state: &TimerState) -> Result<(), StateStoreError> {
        let data = serde_json::to_vec(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(StateStoreError::Write)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(StateStoreError::Write)
    }

    async fn clear(&self) -> Result<(), StateStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateStoreError::Delete(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;

    fn sample_state() -> TimerState {
        let mut state = TimerState::running(
            "Fix auth bug".into(),
            PathBuf::from("/notes/todos/a.md"),
            12,
            Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
        );
        state.is_paused = true;
        state.paused_at = Some(Local.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
        state.total_paused = Duration::minutes(5);
        state
    }

    #[tokio::test]
    async fn save_then_load_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStateStore::new(dir.path());
        let state = sample_state();

        store.save(&state).await?;
        assert_eq!(store.load().await?, Some(state));
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_idle_not_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStateStore::new(dir.path());
        assert_eq!(store.load().await?, None);
        // Clearing an already-idle store is a no-op.
        store.clear().await?;
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_the_state() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStateStore::new(dir.path());
        store.save(&sample_state()).await?;
        store.clear().await?;
        assert_eq!(store.load().await?, None);
        Ok(())
    }

    #[test]
    fn elapsed_subtracts_pauses() {
        let state = sample_state();
        let now = Local.with_ymd_and_hms(2024, 1, 15, 10, 20, 0).unwrap();
        // 50 minutes of wall time, 5 minutes of past pauses, 20 minutes of
        // the still-open pause.
        assert_eq!(state.elapsed(now), Duration::minutes(25));
    }
}
