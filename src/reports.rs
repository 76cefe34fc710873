//! Aggregation over already-fetched records.
//!
//! Everything here is pure. Sums are kept in whole minutes and only turned
//! into hours at the edge, so per-day and per-project totals add up exactly
//! to the range total.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{
    DateRange, Project, ProjectStatus, Task, TaskStatus, TimeEntry, WeekStart,
};

pub fn minutes_to_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}

/// Hours rounded to one decimal place, for display
pub fn display_hours(minutes: i64) -> f64 {
    (minutes_to_hours(minutes) * 10.0).round() / 10.0
}

fn entry_minutes(entry: &TimeEntry) -> i64 {
    entry.duration.unwrap_or(0)
}

/// Entries whose start falls on a day inside `range` (UTC calendar days).
pub fn filter_entries(entries: &[TimeEntry], range: DateRange) -> Vec<TimeEntry> {
    entries
        .iter()
        .filter(|e| range.contains(e.start_time.date_naive()))
        .cloned()
        .collect()
}

/// Closed minutes across all entries. Open entries count as zero.
pub fn total_minutes(entries: &[TimeEntry]) -> i64 {
    entries.iter().map(entry_minutes).fold(0, i64::saturating_add)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectHours {
    pub project_id: String,
    pub name: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHours {
    pub date: NaiveDate,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskHours {
    pub task_id: String,
    pub title: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStatusCounts {
    pub active: usize,
    pub completed: usize,
    pub archived: usize,
}

fn minutes_by<'a>(
    entries: &'a [TimeEntry],
    key: impl Fn(&'a TimeEntry) -> &'a str,
) -> HashMap<&'a str, i64> {
    let mut totals = HashMap::new();
    for entry in entries {
        let total = totals.entry(key(entry)).or_insert(0i64);
        *total = total.saturating_add(entry_minutes(entry));
    }
    totals
}

/// Minutes per project, in the order `projects` is given. Projects with no
/// time are left out, as are entries pointing at unknown projects.
pub fn hours_by_project(entries: &[TimeEntry], projects: &[Project]) -> Vec<ProjectHours> {
    let totals = minutes_by(entries, |e| e.project_id.as_str());
    projects
        .iter()
        .filter_map(|p| {
            let minutes = totals.get(p.id.as_str()).copied().unwrap_or(0);
            (minutes > 0).then(|| ProjectHours {
                project_id: p.id.clone(),
                name: p.name.clone(),
                minutes,
            })
        })
        .collect()
}

/// Minutes for every day of the range, including empty days.
pub fn hours_by_day(entries: &[TimeEntry], range: DateRange) -> Vec<DayHours> {
    let mut totals: HashMap<NaiveDate, i64> = HashMap::new();
    for entry in entries {
        let total = totals.entry(entry.start_time.date_naive()).or_insert(0);
        *total = total.saturating_add(entry_minutes(entry));
    }
    range
        .days()
        .map(|date| DayHours {
            date,
            minutes: totals.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Minutes per task with any time, most first. Ties keep task order.
pub fn hours_by_task(entries: &[TimeEntry], tasks: &[Task]) -> Vec<TaskHours> {
    let totals = minutes_by(entries, |e| e.task_id.as_str());
    let mut hours: Vec<TaskHours> = tasks
        .iter()
        .filter_map(|t| {
            let minutes = totals.get(t.id.as_str()).copied().unwrap_or(0);
            (minutes > 0).then(|| TaskHours {
                task_id: t.id.clone(),
                title: t.title.clone(),
                minutes,
            })
        })
        .collect();
    hours.sort_by(|a, b| b.minutes.cmp(&a.minutes));
    hours
}

pub fn top_tasks(entries: &[TimeEntry], tasks: &[Task], limit: usize) -> Vec<TaskHours> {
    let mut hours = hours_by_task(entries, tasks);
    hours.truncate(limit);
    hours
}

pub fn task_status_counts(tasks: &[Task]) -> TaskStatusCounts {
    tasks.iter().fold(TaskStatusCounts::default(), |mut counts, task| {
        match task.status {
            TaskStatus::Pending => counts.pending += 1,
            TaskStatus::InProgress => counts.in_progress += 1,
            TaskStatus::Completed => counts.completed += 1,
        }
        counts
    })
}

pub fn project_status_counts(projects: &[Project]) -> ProjectStatusCounts {
    projects.iter().fold(ProjectStatusCounts::default(), |mut counts, project| {
        match project.status {
            ProjectStatus::Active => counts.active += 1,
            ProjectStatus::Completed => counts.completed += 1,
            ProjectStatus::Archived => counts.archived += 1,
        }
        counts
    })
}

/// Everything the reports view shows for one date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub range: DateRange,
    pub total_minutes: i64,
    pub by_project: Vec<ProjectHours>,
    pub by_day: Vec<DayHours>,
    pub top_tasks: Vec<TaskHours>,
    pub task_status: TaskStatusCounts,
    pub project_status: ProjectStatusCounts,
}

impl Report {
    pub fn build(
        range: DateRange,
        entries: &[TimeEntry],
        projects: &[Project],
        tasks: &[Task],
        top_n: usize,
    ) -> Self {
        let in_range = filter_entries(entries, range);
        Self {
            range,
            total_minutes: total_minutes(&in_range),
            by_project: hours_by_project(&in_range, projects),
            by_day: hours_by_day(&in_range, range),
            top_tasks: top_tasks(&in_range, tasks, top_n),
            task_status: task_status_counts(tasks),
            project_status: project_status_counts(projects),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub week: DateRange,
    pub week_minutes: i64,
    pub active_projects: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub recent_tasks: Vec<Task>,
    pub recent_entries: Vec<TimeEntry>,
}

impl DashboardSummary {
    /// `entries` and `tasks` are expected newest first, as the gateway
    /// returns them. Recent entries leave out open and zero-length ones.
    pub fn build(
        today: NaiveDate,
        week_start: WeekStart,
        entries: &[TimeEntry],
        projects: &[Project],
        tasks: &[Task],
        recent: usize,
    ) -> Self {
        let week = DateRange::week_of(today, week_start);
        let task_counts = task_status_counts(tasks);
        Self {
            week,
            week_minutes: total_minutes(&filter_entries(entries, week)),
            active_projects: project_status_counts(projects).active,
            pending_tasks: task_counts.pending,
            completed_tasks: task_counts.completed,
            recent_tasks: tasks.iter().take(recent).cloned().collect(),
            recent_entries: entries
                .iter()
                .filter(|e| e.duration.is_some_and(|d| d > 0))
                .take(recent)
                .cloned()
                .collect(),
        }
    }
}
