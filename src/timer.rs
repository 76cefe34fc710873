//! Start/stop timer and manual time entries.
//!
//! A user has at most one open time entry. Starting checks the gateway for
//! an open entry and then writes a new one; the check and the write are two
//! separate calls, so two starts racing from different sessions can both
//! pass the check. Whether the second write then succeeds depends on the
//! store (see [`Database::set_single_active_guard`]).
//!
//! [`Database::set_single_active_guard`]: crate::database::Database::set_single_active_guard

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::database::DatabaseError;
use crate::gateway::Gateway;
use crate::models::{
    NewTimeEntry, Task, TimeEntry, TimeEntryPatch, UserContext, ValidationError,
    validate_hours_minutes,
};

#[derive(Debug, Error)]
pub enum TimerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A timer is already running. Please stop the current timer first")]
    AlreadyActive,
    #[error("Time entry {0} is not running")]
    NotActive(String),
    #[error("No timer is running")]
    NoActiveTimer,
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Time entry not found: {0}")]
    EntryNotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Whole seconds between the entry's start and `now`. Display only.
pub fn elapsed(entry: &TimeEntry, now: DateTime<Utc>) -> i64 {
    (now - entry.start_time).num_seconds().max(0)
}

/// Whole minutes from `start` to `end`, rounded down.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds().max(0).div_euclid(60_000)
}

pub struct Timer<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> Timer<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    pub fn start_timer(
        &self,
        ctx: &UserContext,
        task_id: &str,
        description: &str,
    ) -> Result<TimeEntry, TimerError> {
        self.start_timer_at(ctx, task_id, description, Utc::now())
    }

    /// Open a new entry for `task_id` starting at `now`.
    ///
    /// Rejected when the task or description is blank, the task is unknown,
    /// or the user already has an open entry.
    pub fn start_timer_at(
        &self,
        ctx: &UserContext,
        task_id: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, TimerError> {
        let (task, description) = self.checked_input(ctx, task_id, description)?;

        if let Some(active) = self.gateway.get_active_time_entry(ctx)? {
            tracing::warn!(active_entry = %active.id, "start rejected, timer already running");
            return Err(TimerError::AlreadyActive);
        }

        let new_entry = NewTimeEntry {
            task_id: task.id.clone(),
            project_id: task.project_id.clone(),
            start_time: now,
            end_time: None,
            duration: None,
            description,
            is_active: true,
        };
        let id = self
            .gateway
            .create_time_entry(ctx, &new_entry)
            .map_err(|e| match e {
                DatabaseError::ActiveEntryExists => {
                    tracing::warn!("start rejected by store, timer already running");
                    TimerError::AlreadyActive
                }
                other => TimerError::Database(other),
            })?;
        tracing::info!(entry_id = %id, task_id = %task.id, "timer started");

        Ok(TimeEntry {
            id,
            task_id: new_entry.task_id,
            user_id: ctx.user_id().to_string(),
            project_id: new_entry.project_id,
            start_time: now,
            end_time: None,
            duration: None,
            description: new_entry.description,
            is_active: true,
        })
    }

    pub fn stop_timer(&self, ctx: &UserContext, entry_id: &str) -> Result<TimeEntry, TimerError> {
        self.stop_timer_at(ctx, entry_id, Utc::now())
    }

    /// Close an open entry at `now`, recording its duration in whole minutes.
    ///
    /// A closed entry is left untouched and reported as `NotActive`.
    pub fn stop_timer_at(
        &self,
        ctx: &UserContext,
        entry_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, TimerError> {
        let entry = self
            .gateway
            .get_time_entry(ctx, entry_id)?
            .ok_or_else(|| TimerError::EntryNotFound(entry_id.to_string()))?;
        self.close(ctx, entry, now)
    }

    pub fn stop_active(&self, ctx: &UserContext) -> Result<TimeEntry, TimerError> {
        self.stop_active_at(ctx, Utc::now())
    }

    /// Close whichever entry is currently open for the user.
    pub fn stop_active_at(
        &self,
        ctx: &UserContext,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, TimerError> {
        let entry = self
            .gateway
            .get_active_time_entry(ctx)?
            .ok_or(TimerError::NoActiveTimer)?;
        self.close(ctx, entry, now)
    }

    fn close(
        &self,
        ctx: &UserContext,
        entry: TimeEntry,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, TimerError> {
        if !entry.is_active {
            return Err(TimerError::NotActive(entry.id));
        }
        // A clock behind the stored start closes the entry at zero length
        let end_time = now.max(entry.start_time);
        let duration = duration_minutes(entry.start_time, end_time);
        let closed = self
            .gateway
            .update_time_entry(ctx, &entry.id, &TimeEntryPatch::close(end_time, duration))?;
        tracing::info!(entry_id = %closed.id, duration, "timer stopped");
        Ok(closed)
    }

    pub fn log_manual_entry(
        &self,
        ctx: &UserContext,
        task_id: &str,
        description: &str,
        hours: i64,
        minutes: i64,
    ) -> Result<TimeEntry, TimerError> {
        self.log_manual_entry_at(ctx, task_id, description, hours, minutes, Utc::now())
    }

    /// Record an already-finished stretch of work.
    ///
    /// Only the length is known, so start and end are both `now`. The entry is
    /// created closed and does not interact with a running timer.
    pub fn log_manual_entry_at(
        &self,
        ctx: &UserContext,
        task_id: &str,
        description: &str,
        hours: i64,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, TimerError> {
        let duration = validate_hours_minutes(hours, minutes)?;
        let (task, description) = self.checked_input(ctx, task_id, description)?;

        let new_entry = NewTimeEntry {
            task_id: task.id.clone(),
            project_id: task.project_id.clone(),
            start_time: now,
            end_time: Some(now),
            duration: Some(duration),
            description,
            is_active: false,
        };
        let id = self.gateway.create_time_entry(ctx, &new_entry)?;
        tracing::info!(entry_id = %id, duration, "manual entry logged");

        Ok(TimeEntry {
            id,
            task_id: new_entry.task_id,
            user_id: ctx.user_id().to_string(),
            project_id: new_entry.project_id,
            start_time: now,
            end_time: Some(now),
            duration: Some(duration),
            description: new_entry.description,
            is_active: false,
        })
    }

    pub fn active_entry(&self, ctx: &UserContext) -> Result<Option<TimeEntry>, TimerError> {
        Ok(self.gateway.get_active_time_entry(ctx)?)
    }

    /// The newest `limit` entries, open or closed
    pub fn recent_entries(
        &self,
        ctx: &UserContext,
        limit: usize,
    ) -> Result<Vec<TimeEntry>, TimerError> {
        let mut entries = self.gateway.list_time_entries(ctx, None)?;
        entries.truncate(limit);
        Ok(entries)
    }

    fn checked_input(
        &self,
        ctx: &UserContext,
        task_id: &str,
        description: &str,
    ) -> Result<(Task, String), TimerError> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(ValidationError::Missing("task").into());
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::Missing("description").into());
        }
        let task = self
            .gateway
            .get_task(ctx, task_id)?
            .ok_or_else(|| TimerError::TaskNotFound(task_id.to_string()))?;
        Ok((task, description.to_string()))
    }
}
