use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::database::DatabaseError;
use crate::gateway::Gateway;
use crate::models::{
    DateRange, NewProject, NewTask, NewTimeLog, Project, ProjectPatch, ProjectStatus, Task,
    TaskPatch, TaskPriority, TaskStatus, TimeEntry, TimeLog, TimeLogPatch, UserContext,
    ValidationError,
};
use crate::reports::{self, DashboardSummary, Report};
use crate::timer::{self, Timer, TimerError};
use crate::utils::{format_clock, format_duration, parse_date, today};

#[derive(Parser)]
#[command(name = "taskclock")]
#[command(about = "Projects, tasks and a start/stop time tracker")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Act as this user instead of the configured one
    #[arg(short, long)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Start the timer on a task
    Start {
        /// Task ID
        task: String,
        /// What you are working on
        #[arg(short, long)]
        description: String,
    },
    /// Stop the running timer
    Stop,
    /// Show the running timer (default if no subcommand)
    Status,
    /// Log time already spent on a task
    Log {
        /// Task ID
        task: String,
        /// What you worked on
        #[arg(short, long)]
        description: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        hours: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        minutes: i64,
    },
    /// List recent time entries
    Entries {
        /// Only entries for this task
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Manage daily time logs
    Timelog {
        #[command(subcommand)]
        action: TimeLogCommand,
    },
    /// Hours by day, project and task over a date range
    Report {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        json: bool,
    },
    /// This week's totals and recent activity
    Dashboard {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "active")]
        status: ProjectStatus,
    },
    /// List projects, newest first
    List {
        #[arg(long)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        json: bool,
    },
    /// Change some fields of a project
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    /// Delete a project
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task in a project
    Add {
        title: String,
        /// Project ID
        #[arg(long)]
        project: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: TaskPriority,
        #[arg(long, default_value = "pending")]
        status: TaskStatus,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks, newest first
    List {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Only tasks whose title or description contains this text
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Change some fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Delete a task
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TimeLogCommand {
    /// Record hours and minutes against a task for a day
    Add {
        /// Task ID
        task: String,
        #[arg(short, long)]
        description: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        hours: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        minutes: i64,
        /// Day worked (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// List time logs, newest first
    List {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        json: bool,
    },
    /// Change some fields of a time log
    Edit {
        id: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        hours: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        minutes: Option<i64>,
        /// Day worked (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a time log
    Delete { id: String },
}

#[derive(Args, Debug, Default, Clone)]
pub struct RangeArgs {
    /// The current week
    #[arg(long, conflicts_with_all = ["month", "from", "to"])]
    pub week: bool,
    /// The current month
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: bool,
    /// First day (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    /// Last day (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to {action}. Please try again.")]
    Gateway {
        action: &'static str,
        #[source]
        source: DatabaseError,
    },
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Timer(TimerError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Failed to write output: {0}")]
    OutputError(#[from] serde_json::Error),
}

/// Map a store failure for the user: missing records and rejected input
/// keep their message, anything else is logged and reported generically.
fn gateway_failure(action: &'static str) -> impl FnOnce(DatabaseError) -> CliError {
    move |err| match err {
        DatabaseError::NotFound { kind, id } => CliError::NotFound { kind, id },
        DatabaseError::Validation(e) => CliError::Validation(e),
        other => {
            tracing::error!(action, error = %other, "gateway call failed");
            CliError::Gateway { action, source: other }
        }
    }
}

fn timer_failure(action: &'static str) -> impl FnOnce(TimerError) -> CliError {
    move |err| match err {
        TimerError::Database(e) => gateway_failure(action)(e),
        TimerError::Validation(e) => CliError::Validation(e),
        other => CliError::Timer(other),
    }
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, CliError> {
    parse_date(value)
        .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", value, e)))
}

impl RangeArgs {
    /// Resolve to a concrete range; with no flags, the current week
    pub fn resolve(&self, config: &Config, today: NaiveDate) -> Result<DateRange, CliError> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => {
                Ok(DateRange::new(parse_date_arg(from)?, parse_date_arg(to)?)?)
            }
            _ if self.month => Ok(DateRange::month_of(today)),
            _ => Ok(DateRange::week_of(today, config.reports.week_start)),
        }
    }

    fn is_set(&self) -> bool {
        self.week || self.month || self.from.is_some()
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_entry_line(entry: &TimeEntry) {
    let length = match entry.duration {
        Some(minutes) => format_duration(minutes),
        None => "Active".to_string(),
    };
    println!(
        "{}  {}  {:>8}  {}",
        entry.id,
        entry.start_time.format("%b %d, %Y %H:%M"),
        length,
        entry.description
    );
}

/// Handle `project add`
pub fn handle_project_add(
    ctx: &UserContext,
    db: &impl Gateway,
    name: String,
    description: String,
    status: ProjectStatus,
) -> Result<String, CliError> {
    let project = NewProject {
        name,
        description,
        status,
    };
    project.validate()?;
    let id = db
        .create_project(ctx, &project)
        .map_err(gateway_failure("create project"))?;
    println!("Project created successfully (ID: {})", id);
    Ok(id)
}

/// Handle `project list`
pub fn handle_project_list(
    ctx: &UserContext,
    db: &impl Gateway,
    status: Option<ProjectStatus>,
    json: bool,
) -> Result<Vec<Project>, CliError> {
    let mut projects = db
        .list_projects(ctx)
        .map_err(gateway_failure("load projects"))?;
    if let Some(status) = status {
        projects.retain(|p| p.status == status);
    }

    if json {
        print_json(&projects)?;
    } else if projects.is_empty() {
        println!("No projects found");
    } else {
        for p in &projects {
            println!("{}  {:<9}  {}", p.id, p.status, p.name);
        }
    }
    Ok(projects)
}

/// Handle `project edit`
pub fn handle_project_edit(
    ctx: &UserContext,
    db: &impl Gateway,
    id: &str,
    patch: ProjectPatch,
) -> Result<Project, CliError> {
    if patch.is_empty() {
        return Err(ValidationError::Missing("at least one field to change").into());
    }
    patch.validate()?;
    let project = db
        .update_project(ctx, id, &patch)
        .map_err(gateway_failure("update project"))?;
    println!("Project updated: {} ({})", project.name, project.status);
    Ok(project)
}

/// Handle `project delete`
pub fn handle_project_delete(
    ctx: &UserContext,
    db: &impl Gateway,
    id: &str,
) -> Result<(), CliError> {
    db.delete_project(ctx, id)
        .map_err(gateway_failure("delete project"))?;
    println!("Project deleted");
    Ok(())
}

/// Handle `task add`
#[allow(clippy::too_many_arguments)]
pub fn handle_task_add(
    ctx: &UserContext,
    db: &impl Gateway,
    title: String,
    project: String,
    description: String,
    priority: TaskPriority,
    status: TaskStatus,
    due: Option<String>,
) -> Result<String, CliError> {
    let due_date = due.as_deref().map(parse_date_arg).transpose()?;
    let task = NewTask {
        title,
        description,
        project_id: project,
        status,
        priority,
        due_date,
    };
    task.validate()?;

    // Storage does not check the reference, so check it here
    if db
        .get_project(ctx, &task.project_id)
        .map_err(gateway_failure("load project"))?
        .is_none()
    {
        return Err(CliError::NotFound {
            kind: "Project",
            id: task.project_id,
        });
    }

    let id = db
        .create_task(ctx, &task)
        .map_err(gateway_failure("create task"))?;
    println!("Task created successfully (ID: {})", id);
    Ok(id)
}

/// Handle `task list`
pub fn handle_task_list(
    ctx: &UserContext,
    db: &impl Gateway,
    project: Option<&str>,
    status: Option<TaskStatus>,
    search: Option<&str>,
    json: bool,
) -> Result<Vec<Task>, CliError> {
    let mut tasks = db
        .list_tasks(ctx, project)
        .map_err(gateway_failure("load tasks"))?;
    if let Some(status) = status {
        tasks.retain(|t| t.status == status);
    }
    if let Some(term) = search {
        tasks.retain(|t| t.matches_search(term));
    }

    if json {
        print_json(&tasks)?;
    } else if tasks.is_empty() {
        println!("No tasks found");
    } else {
        for t in &tasks {
            let due = t
                .due_date
                .map(|d| format!("  due {}", d))
                .unwrap_or_default();
            println!(
                "{}  {:<11}  {:<6}  {}{}",
                t.id, t.status, t.priority, t.title, due
            );
        }
    }
    Ok(tasks)
}

/// Handle `task edit`
pub fn handle_task_edit(
    ctx: &UserContext,
    db: &impl Gateway,
    id: &str,
    mut patch: TaskPatch,
    due: Option<String>,
    clear_due: bool,
) -> Result<Task, CliError> {
    if clear_due {
        patch.due_date = Some(None);
    } else if let Some(due) = due {
        patch.due_date = Some(Some(parse_date_arg(&due)?));
    }
    if patch.is_empty() {
        return Err(ValidationError::Missing("at least one field to change").into());
    }
    patch.validate()?;

    if let Some(ref project_id) = patch.project_id {
        if db
            .get_project(ctx, project_id)
            .map_err(gateway_failure("load project"))?
            .is_none()
        {
            return Err(CliError::NotFound {
                kind: "Project",
                id: project_id.clone(),
            });
        }
    }

    let task = db
        .update_task(ctx, id, &patch)
        .map_err(gateway_failure("update task"))?;
    println!("Task updated: {} ({}, {})", task.title, task.status, task.priority);
    Ok(task)
}

/// Handle `task delete`
pub fn handle_task_delete(ctx: &UserContext, db: &impl Gateway, id: &str) -> Result<(), CliError> {
    db.delete_task(ctx, id).map_err(gateway_failure("delete task"))?;
    println!("Task deleted");
    Ok(())
}

/// Handle `start`
pub fn handle_start(
    ctx: &UserContext,
    db: &impl Gateway,
    task: &str,
    description: &str,
) -> Result<TimeEntry, CliError> {
    let entry = Timer::new(db)
        .start_timer(ctx, task, description)
        .map_err(timer_failure("start timer"))?;
    println!("Timer started: {}", entry.description);
    Ok(entry)
}

/// Handle `stop`
pub fn handle_stop(ctx: &UserContext, db: &impl Gateway) -> Result<TimeEntry, CliError> {
    let entry = Timer::new(db)
        .stop_active(ctx)
        .map_err(timer_failure("stop timer"))?;
    println!(
        "Timer stopped: {} ({})",
        entry.description,
        format_duration(entry.duration.unwrap_or(0))
    );
    Ok(entry)
}

/// Handle `status`
pub fn handle_status(ctx: &UserContext, db: &impl Gateway) -> Result<Option<TimeEntry>, CliError> {
    let active = Timer::new(db)
        .active_entry(ctx)
        .map_err(timer_failure("load active timer"))?;
    match active {
        Some(ref entry) => println!(
            "{}  {}",
            format_clock(timer::elapsed(entry, Utc::now())),
            entry.description
        ),
        None => println!("No timer running"),
    }
    Ok(active)
}

/// Handle `log`
pub fn handle_log(
    ctx: &UserContext,
    db: &impl Gateway,
    task: &str,
    description: &str,
    hours: i64,
    minutes: i64,
) -> Result<TimeEntry, CliError> {
    let entry = Timer::new(db)
        .log_manual_entry(ctx, task, description, hours, minutes)
        .map_err(timer_failure("save manual entry"))?;
    println!(
        "Logged {} on {}",
        format_duration(entry.duration.unwrap_or(0)),
        entry.description
    );
    Ok(entry)
}

/// Handle `entries`
pub fn handle_entries(
    ctx: &UserContext,
    db: &impl Gateway,
    task: Option<&str>,
    limit: usize,
    json: bool,
) -> Result<Vec<TimeEntry>, CliError> {
    let mut entries = db
        .list_time_entries(ctx, task)
        .map_err(gateway_failure("load time entries"))?;
    entries.truncate(limit);

    if json {
        print_json(&entries)?;
    } else if entries.is_empty() {
        println!("No time entries found");
    } else {
        entries.iter().for_each(print_entry_line);
    }
    Ok(entries)
}

/// Handle `timelog add`
#[allow(clippy::too_many_arguments)]
pub fn handle_timelog_add(
    ctx: &UserContext,
    db: &impl Gateway,
    task: &str,
    description: String,
    hours: i64,
    minutes: i64,
    date: Option<String>,
) -> Result<String, CliError> {
    let date = match date {
        Some(d) => parse_date_arg(&d)?,
        None => today(),
    };
    let task = db
        .get_task(ctx, task)
        .map_err(gateway_failure("load task"))?
        .ok_or_else(|| CliError::NotFound {
            kind: "Task",
            id: task.to_string(),
        })?;
    let log = NewTimeLog {
        task_id: task.id,
        project_id: task.project_id,
        date,
        hours,
        minutes,
        description: description.trim().to_string(),
    };
    log.validate()?;
    let id = db
        .create_time_log(ctx, &log)
        .map_err(gateway_failure("save time log"))?;
    println!("Time log created successfully (ID: {})", id);
    Ok(id)
}

/// Handle `timelog list`
pub fn handle_timelog_list(
    ctx: &UserContext,
    db: &impl Gateway,
    range: Option<DateRange>,
    json: bool,
) -> Result<(), CliError> {
    let logs = db
        .list_time_logs(ctx, range)
        .map_err(gateway_failure("load time logs"))?;
    if json {
        return print_json(&logs);
    }
    if logs.is_empty() {
        println!("No time logs found");
    }
    for log in &logs {
        println!(
            "{}  {}  {:>8}  {}",
            log.id,
            log.date,
            format_duration(log.total_minutes()),
            log.description
        );
    }
    Ok(())
}

/// Handle `timelog edit`
pub fn handle_timelog_edit(
    ctx: &UserContext,
    db: &impl Gateway,
    id: &str,
    patch: TimeLogPatch,
) -> Result<TimeLog, CliError> {
    if patch.is_empty() {
        return Err(ValidationError::Missing("at least one field to change").into());
    }
    patch.validate()?;
    let log = db
        .update_time_log(ctx, id, &patch)
        .map_err(gateway_failure("update time log"))?;
    println!(
        "Time log updated: {} {} {}",
        log.date,
        format_duration(log.total_minutes()),
        log.description
    );
    Ok(log)
}

/// Handle `timelog delete`
pub fn handle_timelog_delete(
    ctx: &UserContext,
    db: &impl Gateway,
    id: &str,
) -> Result<(), CliError> {
    db.delete_time_log(ctx, id)
        .map_err(gateway_failure("delete time log"))?;
    println!("Time log deleted");
    Ok(())
}

/// Handle `report`
pub fn handle_report(
    ctx: &UserContext,
    db: &impl Gateway,
    range: DateRange,
    top_n: usize,
    json: bool,
) -> Result<Report, CliError> {
    let entries = db
        .list_time_entries(ctx, None)
        .map_err(gateway_failure("load report data"))?;
    let projects = db
        .list_projects(ctx)
        .map_err(gateway_failure("load report data"))?;
    let tasks = db
        .list_tasks(ctx, None)
        .map_err(gateway_failure("load report data"))?;

    let report = Report::build(range, &entries, &projects, &tasks, top_n);
    if json {
        print_json(&report)?;
        return Ok(report);
    }

    println!("Report for {}", report.range);
    println!("Total: {:.1}h", reports::display_hours(report.total_minutes));
    println!(
        "Tasks: {} completed, {} in progress, {} pending",
        report.task_status.completed, report.task_status.in_progress, report.task_status.pending
    );
    println!("Active projects: {}", report.project_status.active);

    println!("\nBy day");
    for day in &report.by_day {
        println!("  {}  {:>5.1}h", day.date.format("%b %d"), reports::display_hours(day.minutes));
    }
    if !report.by_project.is_empty() {
        println!("\nBy project");
        for p in &report.by_project {
            println!("  {:>5.1}h  {}", reports::display_hours(p.minutes), p.name);
        }
    }
    if !report.top_tasks.is_empty() {
        println!("\nTop tasks");
        for t in &report.top_tasks {
            println!("  {:>5.1}h  {}", reports::display_hours(t.minutes), t.title);
        }
    }
    Ok(report)
}

/// Handle `dashboard`
pub fn handle_dashboard(
    ctx: &UserContext,
    db: &impl Gateway,
    config: &Config,
    json: bool,
) -> Result<DashboardSummary, CliError> {
    let entries = db
        .list_time_entries(ctx, None)
        .map_err(gateway_failure("load dashboard data"))?;
    let projects = db
        .list_projects(ctx)
        .map_err(gateway_failure("load dashboard data"))?;
    let tasks = db
        .list_tasks(ctx, None)
        .map_err(gateway_failure("load dashboard data"))?;

    let summary = DashboardSummary::build(
        today(),
        config.reports.week_start,
        &entries,
        &projects,
        &tasks,
        config.reports.recent_entries,
    );
    if json {
        print_json(&summary)?;
        return Ok(summary);
    }

    println!("This week ({}): {:.1}h", summary.week, reports::display_hours(summary.week_minutes));
    println!("Active projects: {}", summary.active_projects);
    println!("Pending tasks: {}", summary.pending_tasks);
    println!("Completed tasks: {}", summary.completed_tasks);
    if !summary.recent_tasks.is_empty() {
        println!("\nRecent tasks");
        for t in &summary.recent_tasks {
            println!("  {}  {:<11}  {}", t.id, t.status, t.title);
        }
    }
    if !summary.recent_entries.is_empty() {
        println!("\nRecent entries");
        summary.recent_entries.iter().for_each(print_entry_line);
    }
    Ok(summary)
}

/// Dispatch a parsed command
pub fn run(
    command: Commands,
    ctx: &UserContext,
    db: &impl Gateway,
    config: &Config,
) -> Result<(), CliError> {
    match command {
        Commands::Project { action } => match action {
            ProjectCommand::Add { name, description, status } => {
                handle_project_add(ctx, db, name, description, status)?;
            }
            ProjectCommand::List { status, json } => {
                handle_project_list(ctx, db, status, json)?;
            }
            ProjectCommand::Edit { id, name, description, status } => {
                let patch = ProjectPatch { name, description, status };
                handle_project_edit(ctx, db, &id, patch)?;
            }
            ProjectCommand::Delete { id } => handle_project_delete(ctx, db, &id)?,
        },
        Commands::Task { action } => match action {
            TaskCommand::Add { title, project, description, priority, status, due } => {
                handle_task_add(ctx, db, title, project, description, priority, status, due)?;
            }
            TaskCommand::List { project, status, search, json } => {
                handle_task_list(ctx, db, project.as_deref(), status, search.as_deref(), json)?;
            }
            TaskCommand::Edit {
                id,
                title,
                description,
                project,
                status,
                priority,
                due,
                clear_due,
            } => {
                let patch = TaskPatch {
                    title,
                    description,
                    project_id: project,
                    status,
                    priority,
                    due_date: None,
                };
                handle_task_edit(ctx, db, &id, patch, due, clear_due)?;
            }
            TaskCommand::Delete { id } => handle_task_delete(ctx, db, &id)?,
        },
        Commands::Start { task, description } => {
            handle_start(ctx, db, &task, &description)?;
        }
        Commands::Stop => {
            handle_stop(ctx, db)?;
        }
        Commands::Status => {
            handle_status(ctx, db)?;
        }
        Commands::Log { task, description, hours, minutes } => {
            handle_log(ctx, db, &task, &description, hours, minutes)?;
        }
        Commands::Entries { task, limit, json } => {
            let limit = limit.unwrap_or(config.reports.recent_entries);
            handle_entries(ctx, db, task.as_deref(), limit, json)?;
        }
        Commands::Timelog { action } => match action {
            TimeLogCommand::Add { task, description, hours, minutes, date } => {
                handle_timelog_add(ctx, db, &task, description, hours, minutes, date)?;
            }
            TimeLogCommand::List { range, json } => {
                let range = if range.is_set() {
                    Some(range.resolve(config, today())?)
                } else {
                    None
                };
                handle_timelog_list(ctx, db, range, json)?;
            }
            TimeLogCommand::Edit { id, description, hours, minutes, date } => {
                let patch = TimeLogPatch {
                    date: date.as_deref().map(parse_date_arg).transpose()?,
                    hours,
                    minutes,
                    description: description.map(|d| d.trim().to_string()),
                };
                handle_timelog_edit(ctx, db, &id, patch)?;
            }
            TimeLogCommand::Delete { id } => handle_timelog_delete(ctx, db, &id)?,
        },
        Commands::Report { range, json } => {
            let range = range.resolve(config, today())?;
            handle_report(ctx, db, range, config.reports.top_tasks, json)?;
        }
        Commands::Dashboard { json } => {
            handle_dashboard(ctx, db, config, json)?;
        }
    }
    Ok(())
}
