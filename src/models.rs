use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
    #[error("Unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
    #[error("Invalid time entry: {0}")]
    InconsistentEntry(String),
}

/// The user every gateway and core call acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: String,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Result<Self, ValidationError> {
        let user_id = user_id.into().trim().to_string();
        if user_id.is_empty() {
            return Err(ValidationError::Missing("user id"));
        }
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "archived" => Ok(ProjectStatus::Archived),
            _ => Err(ValidationError::UnknownValue {
                kind: "project status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" | "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(ValidationError::UnknownValue {
                kind: "task status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ValidationError::UnknownValue {
                kind: "task priority",
                value: s.to_string(),
            }),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        })*
    };
}

display_as_str!(ProjectStatus, TaskStatus, TaskPriority);

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::Active,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "project name")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            require(name, "project name")?;
        }
        Ok(())
    }

    pub fn apply_to(&self, project: &mut Project) {
        if let Some(ref name) = self.name {
            project.name = name.clone();
        }
        if let Some(ref description) = self.description {
            project.description = description.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub project_id: String,
    pub assigned_to: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project_id: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            project_id: project_id.into(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            due_date: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "task title")?;
        require(&self.project_id, "project")
    }
}

impl Task {
    /// Case-insensitive substring match on title or description. An empty
    /// term matches every task.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

/// Partial task update. `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.project_id.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref title) = self.title {
            require(title, "task title")?;
        }
        if let Some(ref project_id) = self.project_id {
            require(project_id, "project")?;
        }
        Ok(())
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(ref project_id) = self.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Whole minutes, present once the entry is closed
    pub duration: Option<i64>,
    pub description: String,
    pub is_active: bool,
}

impl TimeEntry {
    /// Checks the open/closed shape of the entry.
    ///
    /// An open entry has no end time and no duration. A closed entry has a
    /// duration, and its end time (when present) is not before its start.
    pub fn check_consistency(&self) -> Result<(), ValidationError> {
        check_entry_shape(self.start_time, self.end_time, self.duration, self.is_active)
    }
}

fn check_entry_shape(
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    duration: Option<i64>,
    is_active: bool,
) -> Result<(), ValidationError> {
    if is_active {
        if end_time.is_some() || duration.is_some() {
            return Err(ValidationError::InconsistentEntry(
                "an active entry cannot have an end time or duration".to_string(),
            ));
        }
        return Ok(());
    }
    match duration {
        None => {
            return Err(ValidationError::InconsistentEntry(
                "a closed entry needs a duration".to_string(),
            ));
        }
        Some(d) if d < 0 => {
            return Err(ValidationError::InconsistentEntry(format!(
                "duration cannot be negative ({d})"
            )));
        }
        Some(_) => {}
    }
    if let Some(end) = end_time {
        if end < start_time {
            return Err(ValidationError::InconsistentEntry(
                "end time is before start time".to_string(),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTimeEntry {
    pub task_id: String,
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub description: String,
    pub is_active: bool,
}

impl NewTimeEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.task_id, "task")?;
        require(&self.description, "description")?;
        check_entry_shape(self.start_time, self.end_time, self.duration, self.is_active)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeEntryPatch {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl TimeEntryPatch {
    /// The patch that closes an open entry.
    pub fn close(end_time: DateTime<Utc>, duration: i64) -> Self {
        Self {
            end_time: Some(end_time),
            duration: Some(duration),
            is_active: Some(false),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, entry: &mut TimeEntry) {
        if let Some(start_time) = self.start_time {
            entry.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            entry.end_time = Some(end_time);
        }
        if let Some(duration) = self.duration {
            entry.duration = Some(duration);
        }
        if let Some(ref description) = self.description {
            entry.description = description.clone();
        }
        if let Some(is_active) = self.is_active {
            entry.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLog {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub project_id: String,
    pub date: NaiveDate,
    pub hours: i64,
    pub minutes: i64,
    pub description: String,
}

impl TimeLog {
    pub fn total_minutes(&self) -> i64 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTimeLog {
    pub task_id: String,
    pub project_id: String,
    pub date: NaiveDate,
    pub hours: i64,
    pub minutes: i64,
    pub description: String,
}

impl NewTimeLog {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.task_id, "task")?;
        require(&self.description, "description")?;
        validate_hours_minutes(self.hours, self.minutes).map(|_| ())
    }
}

/// Partial time log update. Hours and minutes are checked again against the
/// merged record, since either may change alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeLogPatch {
    pub date: Option<NaiveDate>,
    pub hours: Option<i64>,
    pub minutes: Option<i64>,
    pub description: Option<String>,
}

impl TimeLogPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.hours.is_none()
            && self.minutes.is_none()
            && self.description.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref description) = self.description {
            require(description, "description")?;
        }
        validate_hours_minutes(self.hours.unwrap_or(0), self.minutes.unwrap_or(0)).map(|_| ())
    }

    pub fn apply_to(&self, log: &mut TimeLog) {
        if let Some(date) = self.date {
            log.date = date;
        }
        if let Some(hours) = self.hours {
            log.hours = hours;
        }
        if let Some(minutes) = self.minutes {
            log.minutes = minutes;
        }
        if let Some(ref description) = self.description {
            log.description = description.clone();
        }
    }
}

/// Hours must be non-negative and minutes within 0..=59. Returns the length
/// in whole minutes.
pub fn validate_hours_minutes(hours: i64, minutes: i64) -> Result<i64, ValidationError> {
    if hours < 0 {
        return Err(ValidationError::OutOfRange {
            field: "hours",
            reason: format!("{hours} is negative"),
        });
    }
    if !(0..=59).contains(&minutes) {
        return Err(ValidationError::OutOfRange {
            field: "minutes",
            reason: format!("{minutes} is not between 0 and 59"),
        });
    }
    hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "hours",
            reason: format!("{hours} hours is too long to record"),
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::OutOfRange {
                field: "date range",
                reason: format!("{end} is before {start}"),
            });
        }
        Ok(Self { start, end })
    }

    /// The seven-day week containing `date`.
    pub fn week_of(date: NaiveDate, week_start: WeekStart) -> Self {
        let offset = match week_start {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        let start = date - Days::new(u64::from(offset));
        Self {
            start,
            end: start + Days::new(6),
        }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let next_month = start.checked_add_months(chrono::Months::new(1));
        let end = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day of the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_strings_round_trip_through_from_str() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert_eq!("ARCHIVED".parse::<ProjectStatus>().unwrap(), ProjectStatus::Archived);
        assert!("paused".parse::<ProjectStatus>().is_err());
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn task_status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn user_context_rejects_blank_ids() {
        assert!(UserContext::new("  ").is_err());
        assert_eq!(UserContext::new(" u1 ").unwrap().user_id(), "u1");
    }

    #[test]
    fn hours_and_minutes_are_range_checked() {
        assert_eq!(validate_hours_minutes(0, 0), Ok(0));
        assert_eq!(validate_hours_minutes(3, 59), Ok(239));
        assert!(validate_hours_minutes(-1, 0).is_err());
        assert!(validate_hours_minutes(1, 60).is_err());
        assert!(validate_hours_minutes(1, -5).is_err());
    }

    #[test]
    fn hours_too_large_for_minutes_are_rejected() {
        assert!(matches!(
            validate_hours_minutes(i64::MAX / 2, 0),
            Err(ValidationError::OutOfRange { field: "hours", .. })
        ));
        let max_hours = i64::MAX / 60;
        assert_eq!(validate_hours_minutes(max_hours, 0), Ok(max_hours * 60));
        assert!(validate_hours_minutes(max_hours, 59).is_err());
    }

    #[test]
    fn task_patch_merges_only_set_fields() {
        let mut task = Task {
            id: "t1".to_string(),
            title: "Design".to_string(),
            description: "mockups".to_string(),
            project_id: "p1".to_string(),
            assigned_to: "u1".to_string(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Low,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            due_date: Some(date(2024, 2, 1)),
        };
        let patch = TaskPatch {
            status: Some(TaskStatus::InProgress),
            due_date: Some(None),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.due_date, None);
        assert_eq!(task.title, "Design");
        assert_eq!(task.priority, TaskPriority::Low);
    }

    #[test]
    fn task_search_ignores_case_and_checks_description() {
        let task = Task {
            id: "t1".to_string(),
            title: "Landing Page".to_string(),
            description: "Hero copy and CTA".to_string(),
            project_id: "p1".to_string(),
            assigned_to: "u1".to_string(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            due_date: None,
        };
        assert!(task.matches_search("landing"));
        assert!(task.matches_search("cta"));
        assert!(task.matches_search(""));
        assert!(!task.matches_search("footer"));
    }

    #[test]
    fn entry_shape_rules() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert!(check_entry_shape(start, None, None, true).is_ok());
        assert!(check_entry_shape(start, None, Some(3), true).is_err());
        assert!(check_entry_shape(start, Some(start), None, false).is_err());
        assert!(check_entry_shape(start, Some(start), Some(90), false).is_ok());
        let before = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        assert!(check_entry_shape(start, Some(before), Some(0), false).is_err());
    }

    #[test]
    fn week_of_respects_week_start() {
        // 2024-05-15 is a Wednesday
        let sunday_week = DateRange::week_of(date(2024, 5, 15), WeekStart::Sunday);
        assert_eq!(sunday_week.start(), date(2024, 5, 12));
        assert_eq!(sunday_week.end(), date(2024, 5, 18));

        let monday_week = DateRange::week_of(date(2024, 5, 15), WeekStart::Monday);
        assert_eq!(monday_week.start(), date(2024, 5, 13));
        assert_eq!(monday_week.end(), date(2024, 5, 19));
    }

    #[test]
    fn month_of_covers_whole_month() {
        let feb = DateRange::month_of(date(2024, 2, 10));
        assert_eq!(feb.start(), date(2024, 2, 1));
        assert_eq!(feb.end(), date(2024, 2, 29));
        assert_eq!(feb.days().count(), 29);

        let dec = DateRange::month_of(date(2023, 12, 31));
        assert_eq!(dec.end(), date(2023, 12, 31));
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 1)).is_err());
        let one_day = DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        assert!(one_day.contains(date(2024, 1, 1)));
        assert!(!one_day.contains(date(2024, 1, 2)));
    }
}
