//! Start/stop stopwatch against one task, persisted as a time entry on stop.

use crate::errors::{AppError, AppResult};
use crate::models::task::{Task, TimeEntry};
use crate::source::TaskFeed;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Runs shorter than this are discarded.
pub const MIN_TRACKED_MS: i64 = 2_000;
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimerSession {
    pub task_id: String,
    pub start_time: DateTime<Utc>,
}

impl ActiveTimerSession {
    pub const STORE_KEY: &'static str = "active_timer";

    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds().max(0)
    }
}

/// Whole minutes recorded for `elapsed_ms`, or `None` when too short to keep.
pub fn tracked_minutes(elapsed_ms: i64) -> Option<i64> {
    if elapsed_ms < MIN_TRACKED_MS {
        return None;
    }
    let minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;
    Some(minutes.max(1))
}

#[derive(Debug, Default)]
pub struct TimeTracker {
    active: Option<ActiveTimerSession>,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a session persisted by an earlier process.
    pub fn restore(active: Option<ActiveTimerSession>) -> Self {
        Self { active }
    }

    pub fn active(&self) -> Option<&ActiveTimerSession> {
        self.active.as_ref()
    }

    pub fn start(&mut self, task_id: &str) -> AppResult<&ActiveTimerSession> {
        self.start_at(task_id, Utc::now())
    }

    pub fn start_at(&mut self, task_id: &str, now: DateTime<Utc>) -> AppResult<&ActiveTimerSession> {
        if let Some(a) = &self.active {
            return Err(AppError::TimerAlreadyActive(a.task_id.clone()));
        }
        log::debug!("timer started for task {task_id}");
        Ok(&*self.active.insert(ActiveTimerSession {
            task_id: task_id.to_string(),
            start_time: now,
        }))
    }

    /// Stop the running timer. Returns the recorded entry, `None` for a
    /// discarded short run. An unknown task keeps the session running;
    /// otherwise the session is gone afterwards, whatever the write did.
    pub async fn stop_at<F>(
        &mut self,
        now: DateTime<Utc>,
        feed: &F,
        task: Option<&Task>,
        user_id: Option<&str>,
    ) -> AppResult<Option<TimeEntry>>
    where
        F: TaskFeed + ?Sized,
    {
        let Some(running) = &self.active else {
            return Err(AppError::NoActiveTimer);
        };
        let Some(task) = task else {
            return Err(AppError::NotFound(format!(
                "task {} is not in the task list, timer left running",
                running.task_id
            )));
        };
        let session = self.active.take().ok_or(AppError::NoActiveTimer)?;
        let elapsed_ms = (now - session.start_time).num_milliseconds();

        let Some(duration_minutes) = tracked_minutes(elapsed_ms) else {
            log::info!("timer for task {} discarded ({elapsed_ms} ms)", session.task_id);
            return Ok(None);
        };

        let entry = TimeEntry {
            user_id: user_id
                .filter(|u| !u.is_empty())
                .unwrap_or(ANONYMOUS_USER)
                .to_string(),
            client_id: task.client_id().unwrap_or_default().to_string(),
            task_id: session.task_id,
            start_time: session.start_time,
            end_time: now,
            duration_minutes,
            notes: None,
        };
        feed.create_time_entry(&entry).await?;
        log::info!(
            "recorded {} min on task {}",
            entry.duration_minutes,
            entry.task_id
        );
        Ok(Some(entry))
    }

    pub async fn stop<F>(
        &mut self,
        feed: &F,
        task: Option<&Task>,
        user_id: Option<&str>,
    ) -> AppResult<Option<TimeEntry>>
    where
        F: TaskFeed + ?Sized,
    {
        self.stop_at(Utc::now(), feed, task, user_id).await
    }

    /// Forget the running session without recording anything.
    pub fn discard(&mut self) -> Option<ActiveTimerSession> {
        self.active.take()
    }
}
