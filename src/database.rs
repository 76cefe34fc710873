use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::models::{
    DateRange, NewProject, NewTask, NewTimeEntry, NewTimeLog, Project, ProjectPatch,
    ProjectStatus, Task, TaskPatch, TaskPriority, TaskStatus, TimeEntry, TimeEntryPatch, TimeLog,
    TimeLogPatch, UserContext, ValidationError, validate_hours_minutes,
};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Time entry {0} is closed and cannot be reopened")]
    Reopen(String),
    #[error("An active time entry already exists for this user")]
    ActiveEntryExists,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

const SINGLE_ACTIVE_INDEX: &str = "idx_time_entries_single_active";

const PROJECT_COLUMNS: &str = "id, name, description, created_at, created_by, status";
const TASK_COLUMNS: &str =
    "id, title, description, project_id, assigned_to, status, priority, created_at, due_date";
const TIME_ENTRY_COLUMNS: &str =
    "id, task_id, user_id, project_id, start_time, end_time, duration, description, is_active";
const TIME_LOG_COLUMNS: &str =
    "id, task_id, user_id, project_id, date, hours, minutes, description";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        tracing::debug!("opened database at {}", db_path.display());

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a private in-memory database with the full schema
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS projects (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL,
                created_by      TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'active'
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                project_id      TEXT NOT NULL,
                assigned_to     TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'pending',
                priority        TEXT NOT NULL DEFAULT 'medium',
                created_at      TEXT NOT NULL,
                due_date        TEXT
            );

            CREATE TABLE IF NOT EXISTS time_entries (
                id              TEXT PRIMARY KEY,
                task_id         TEXT NOT NULL,
                user_id         TEXT NOT NULL,
                project_id      TEXT NOT NULL,
                start_time      TEXT NOT NULL,
                end_time        TEXT,
                duration        INTEGER,
                description     TEXT NOT NULL,
                is_active       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS time_logs (
                id              TEXT PRIMARY KEY,
                task_id         TEXT NOT NULL,
                user_id         TEXT NOT NULL,
                project_id      TEXT NOT NULL,
                date            TEXT NOT NULL,
                hours           INTEGER NOT NULL,
                minutes         INTEGER NOT NULL,
                description     TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_projects_created_by ON projects(created_by, created_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_assigned_to ON tasks(assigned_to, created_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_time_entries_user_start
                ON time_entries(user_id, start_time);
            CREATE INDEX IF NOT EXISTS idx_time_logs_user_date ON time_logs(user_id, date);",
        )?;

        self.set_single_active_guard(true)?;
        tracing::debug!("database schema ready");
        Ok(())
    }

    /// Turn the storage-level single-active-entry guard on or off.
    ///
    /// With the guard on, a partial unique index allows at most one row per
    /// user with `is_active = 1`, so a second concurrent start fails on write.
    /// With it off, only the timer's read-then-write check stands between two
    /// starts, and two racing starts can both succeed.
    pub fn set_single_active_guard(&self, enabled: bool) -> Result<(), DatabaseError> {
        if enabled {
            self.conn.execute(
                &format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {SINGLE_ACTIVE_INDEX}
                     ON time_entries(user_id) WHERE is_active = 1"
                ),
                [],
            )?;
        } else {
            self.conn
                .execute(&format!("DROP INDEX IF EXISTS {SINGLE_ACTIVE_INDEX}"), [])?;
        }
        tracing::debug!(enabled, "single active entry guard");
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn new_id() -> String {
        Uuid::now_v7().to_string()
    }

    fn row_to_project(row: &rusqlite::Row) -> Result<Project, rusqlite::Error> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            created_by: row.get(4)?,
            status: row.get(5)?,
        })
    }

    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            project_id: row.get(3)?,
            assigned_to: row.get(4)?,
            status: row.get(5)?,
            priority: row.get(6)?,
            created_at: row.get(7)?,
            due_date: row.get(8)?,
        })
    }

    fn row_to_time_entry(row: &rusqlite::Row) -> Result<TimeEntry, rusqlite::Error> {
        Ok(TimeEntry {
            id: row.get(0)?,
            task_id: row.get(1)?,
            user_id: row.get(2)?,
            project_id: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            duration: row.get(6)?,
            description: row.get(7)?,
            is_active: row.get::<_, i64>(8)? != 0,
        })
    }

    fn row_to_time_log(row: &rusqlite::Row) -> Result<TimeLog, rusqlite::Error> {
        Ok(TimeLog {
            id: row.get(0)?,
            task_id: row.get(1)?,
            user_id: row.get(2)?,
            project_id: row.get(3)?,
            date: row.get(4)?,
            hours: row.get(5)?,
            minutes: row.get(6)?,
            description: row.get(7)?,
        })
    }

    fn query_project(
        conn: &Connection,
        ctx: &UserContext,
        id: &str,
    ) -> Result<Option<Project>, DatabaseError> {
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1 AND created_by = ?2"),
            rusqlite::params![id, ctx.user_id()],
            Self::row_to_project,
        )
        .optional()
        .map_err(DatabaseError::from)
    }

    fn query_task(
        conn: &Connection,
        ctx: &UserContext,
        id: &str,
    ) -> Result<Option<Task>, DatabaseError> {
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND assigned_to = ?2"),
            rusqlite::params![id, ctx.user_id()],
            Self::row_to_task,
        )
        .optional()
        .map_err(DatabaseError::from)
    }

    fn query_time_entry(
        conn: &Connection,
        ctx: &UserContext,
        id: &str,
    ) -> Result<Option<TimeEntry>, DatabaseError> {
        conn.query_row(
            &format!(
                "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE id = ?1 AND user_id = ?2"
            ),
            rusqlite::params![id, ctx.user_id()],
            Self::row_to_time_entry,
        )
        .optional()
        .map_err(DatabaseError::from)
    }

    fn query_time_log(
        conn: &Connection,
        ctx: &UserContext,
        id: &str,
    ) -> Result<Option<TimeLog>, DatabaseError> {
        conn.query_row(
            &format!("SELECT {TIME_LOG_COLUMNS} FROM time_logs WHERE id = ?1 AND user_id = ?2"),
            rusqlite::params![id, ctx.user_id()],
            Self::row_to_time_log,
        )
        .optional()
        .map_err(DatabaseError::from)
    }

    /// Delete one owned row, failing with `NotFound` when nothing matched
    fn delete_owned(
        &self,
        table: &str,
        owner_column: &str,
        kind: &'static str,
        ctx: &UserContext,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            &format!("DELETE FROM {table} WHERE id = ?1 AND {owner_column} = ?2"),
            rusqlite::params![id, ctx.user_id()],
        )?;
        tx.commit()?;
        if removed == 0 {
            return Err(DatabaseError::NotFound { kind, id: id.to_string() });
        }
        tracing::info!(kind, id, "deleted");
        Ok(())
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Gateway for Database {
    fn create_project(
        &self,
        ctx: &UserContext,
        project: &NewProject,
    ) -> Result<String, DatabaseError> {
        project.validate()?;
        let id = Self::new_id();
        self.conn.execute(
            "INSERT INTO projects (id, name, description, created_at, created_by, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                id,
                project.name.trim(),
                project.description,
                Utc::now(),
                ctx.user_id(),
                project.status
            ],
        )?;
        tracing::info!(project_id = %id, "created project");
        Ok(id)
    }

    fn get_project(&self, ctx: &UserContext, id: &str) -> Result<Option<Project>, DatabaseError> {
        Self::query_project(&self.conn, ctx, id)
    }

    fn list_projects(&self, ctx: &UserContext) -> Result<Vec<Project>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE created_by = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let projects = stmt
            .query_map(rusqlite::params![ctx.user_id()], Self::row_to_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn update_project(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &ProjectPatch,
    ) -> Result<Project, DatabaseError> {
        patch.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let mut project = Self::query_project(&tx, ctx, id)?
            .ok_or_else(|| DatabaseError::NotFound { kind: "Project", id: id.to_string() })?;
        patch.apply_to(&mut project);
        tx.execute(
            "UPDATE projects SET name = ?1, description = ?2, status = ?3 WHERE id = ?4",
            rusqlite::params![project.name, project.description, project.status, id],
        )?;
        tx.commit()?;
        Ok(project)
    }

    fn delete_project(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError> {
        self.delete_owned("projects", "created_by", "Project", ctx, id)
    }

    fn create_task(&self, ctx: &UserContext, task: &NewTask) -> Result<String, DatabaseError> {
        task.validate()?;
        let id = Self::new_id();
        self.conn.execute(
            "INSERT INTO tasks (id, title, description, project_id, assigned_to, status, priority,
             created_at, due_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                id,
                task.title.trim(),
                task.description,
                task.project_id,
                ctx.user_id(),
                task.status,
                task.priority,
                Utc::now(),
                task.due_date
            ],
        )?;
        tracing::info!(task_id = %id, project_id = %task.project_id, "created task");
        Ok(id)
    }

    fn get_task(&self, ctx: &UserContext, id: &str) -> Result<Option<Task>, DatabaseError> {
        Self::query_task(&self.conn, ctx, id)
    }

    fn list_tasks(
        &self,
        ctx: &UserContext,
        project_id: Option<&str>,
    ) -> Result<Vec<Task>, DatabaseError> {
        if let Some(project_id) = project_id {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = ?1 AND project_id = ?2
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let tasks = stmt
                .query_map(rusqlite::params![ctx.user_id(), project_id], Self::row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(tasks);
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let tasks = stmt
            .query_map(rusqlite::params![ctx.user_id()], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn update_task(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, DatabaseError> {
        patch.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let mut task = Self::query_task(&tx, ctx, id)?
            .ok_or_else(|| DatabaseError::NotFound { kind: "Task", id: id.to_string() })?;
        patch.apply_to(&mut task);
        tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, project_id = ?3, status = ?4,
             priority = ?5, due_date = ?6 WHERE id = ?7",
            rusqlite::params![
                task.title,
                task.description,
                task.project_id,
                task.status,
                task.priority,
                task.due_date,
                id
            ],
        )?;
        tx.commit()?;
        Ok(task)
    }

    fn delete_task(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError> {
        self.delete_owned("tasks", "assigned_to", "Task", ctx, id)
    }

    fn create_time_entry(
        &self,
        ctx: &UserContext,
        entry: &NewTimeEntry,
    ) -> Result<String, DatabaseError> {
        entry.validate()?;
        let id = Self::new_id();
        let inserted = self.conn.execute(
            "INSERT INTO time_entries (id, task_id, user_id, project_id, start_time, end_time,
             duration, description, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                id,
                entry.task_id,
                ctx.user_id(),
                entry.project_id,
                entry.start_time,
                entry.end_time,
                entry.duration,
                entry.description,
                if entry.is_active { 1 } else { 0 }
            ],
        );
        match inserted {
            Ok(_) => Ok(id),
            Err(e) if entry.is_active && is_constraint_violation(&e) => {
                Err(DatabaseError::ActiveEntryExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_time_entry(
        &self,
        ctx: &UserContext,
        id: &str,
    ) -> Result<Option<TimeEntry>, DatabaseError> {
        Self::query_time_entry(&self.conn, ctx, id)
    }

    fn list_time_entries(
        &self,
        ctx: &UserContext,
        task_id: Option<&str>,
    ) -> Result<Vec<TimeEntry>, DatabaseError> {
        if let Some(task_id) = task_id {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE user_id = ?1 AND task_id = ?2
                 ORDER BY start_time DESC, rowid DESC"
            ))?;
            let entries = stmt
                .query_map(rusqlite::params![ctx.user_id(), task_id], Self::row_to_time_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(entries);
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE user_id = ?1
             ORDER BY start_time DESC, rowid DESC"
        ))?;
        let entries = stmt
            .query_map(rusqlite::params![ctx.user_id()], Self::row_to_time_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn get_active_time_entry(&self, ctx: &UserContext) -> Result<Option<TimeEntry>, DatabaseError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries
                     WHERE user_id = ?1 AND is_active = 1 LIMIT 1"
                ),
                rusqlite::params![ctx.user_id()],
                Self::row_to_time_entry,
            )
            .optional()
            .map_err(DatabaseError::from)
    }

    fn update_time_entry(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &TimeEntryPatch,
    ) -> Result<TimeEntry, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut entry = Self::query_time_entry(&tx, ctx, id)?
            .ok_or_else(|| DatabaseError::NotFound { kind: "Time entry", id: id.to_string() })?;
        if !entry.is_active && patch.is_active == Some(true) {
            return Err(DatabaseError::Reopen(id.to_string()));
        }
        patch.apply_to(&mut entry);
        entry.check_consistency()?;
        tx.execute(
            "UPDATE time_entries SET start_time = ?1, end_time = ?2, duration = ?3,
             description = ?4, is_active = ?5 WHERE id = ?6",
            rusqlite::params![
                entry.start_time,
                entry.end_time,
                entry.duration,
                entry.description,
                if entry.is_active { 1 } else { 0 },
                id
            ],
        )?;
        tx.commit()?;
        Ok(entry)
    }

    fn delete_time_entry(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError> {
        self.delete_owned("time_entries", "user_id", "Time entry", ctx, id)
    }

    fn create_time_log(
        &self,
        ctx: &UserContext,
        log: &NewTimeLog,
    ) -> Result<String, DatabaseError> {
        log.validate()?;
        let id = Self::new_id();
        self.conn.execute(
            "INSERT INTO time_logs (id, task_id, user_id, project_id, date, hours, minutes,
             description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                id,
                log.task_id,
                ctx.user_id(),
                log.project_id,
                log.date,
                log.hours,
                log.minutes,
                log.description
            ],
        )?;
        tracing::info!(time_log_id = %id, "created time log");
        Ok(id)
    }

    fn get_time_log(&self, ctx: &UserContext, id: &str) -> Result<Option<TimeLog>, DatabaseError> {
        Self::query_time_log(&self.conn, ctx, id)
    }

    fn list_time_logs(
        &self,
        ctx: &UserContext,
        range: Option<DateRange>,
    ) -> Result<Vec<TimeLog>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TIME_LOG_COLUMNS} FROM time_logs WHERE user_id = ?1
             ORDER BY date DESC, rowid DESC"
        ))?;
        let logs = stmt
            .query_map(rusqlite::params![ctx.user_id()], Self::row_to_time_log)?
            .collect::<Result<Vec<_>, _>>()?;

        // Range is applied after the fetch
        match range {
            Some(range) => Ok(logs.into_iter().filter(|log| range.contains(log.date)).collect()),
            None => Ok(logs),
        }
    }

    fn update_time_log(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &TimeLogPatch,
    ) -> Result<TimeLog, DatabaseError> {
        patch.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let mut log = Self::query_time_log(&tx, ctx, id)?
            .ok_or_else(|| DatabaseError::NotFound { kind: "Time log", id: id.to_string() })?;
        patch.apply_to(&mut log);
        validate_hours_minutes(log.hours, log.minutes)?;
        tx.execute(
            "UPDATE time_logs SET date = ?1, hours = ?2, minutes = ?3, description = ?4
             WHERE id = ?5",
            rusqlite::params![log.date, log.hours, log.minutes, log.description, id],
        )?;
        tx.commit()?;
        Ok(log)
    }

    fn delete_time_log(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError> {
        self.delete_owned("time_logs", "user_id", "Time log", ctx, id)
    }
}

macro_rules! text_column {
    ($($ty:ty),*) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e: ValidationError| FromSqlError::Other(Box::new(e)))
                }
            }
        )*
    };
}

text_column!(ProjectStatus, TaskStatus, TaskPriority);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn user(id: &str) -> UserContext {
        UserContext::new(id).unwrap()
    }

    fn seed_task(db: &Database, ctx: &UserContext) -> (String, String) {
        let project_id = db.create_project(ctx, &NewProject::new("Website")).unwrap();
        let task_id = db
            .create_task(ctx, &NewTask::new("Design", project_id.clone()))
            .unwrap();
        (project_id, task_id)
    }

    fn open_entry(task_id: &str, project_id: &str, start: chrono::DateTime<Utc>) -> NewTimeEntry {
        NewTimeEntry {
            task_id: task_id.to_string(),
            project_id: project_id.to_string(),
            start_time: start,
            end_time: None,
            duration: None,
            description: "design".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn open_in_memory_creates_tables() {
        let db = Database::open_in_memory().expect("should open in-memory DB");
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in ["projects", "tasks", "time_entries", "time_logs"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn initialize_schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.initialize_schema().expect("second schema init");
    }

    #[test]
    fn project_round_trip_keeps_fields() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let mut input = NewProject::new("Website");
        input.description = "Company site".to_string();
        input.status = ProjectStatus::Completed;

        let id = db.create_project(&ctx, &input).unwrap();
        let project = db.get_project(&ctx, &id).unwrap().expect("project exists");

        assert_eq!(project.id, id);
        assert_eq!(project.name, "Website");
        assert_eq!(project.description, "Company site");
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.created_by, "u1");
    }

    #[test]
    fn task_round_trip_keeps_due_date() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let project_id = db.create_project(&ctx, &NewProject::new("Website")).unwrap();
        let mut input = NewTask::new("Design", project_id.clone());
        input.priority = TaskPriority::High;
        input.status = TaskStatus::InProgress;
        input.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);

        let id = db.create_task(&ctx, &input).unwrap();
        let task = db.get_task(&ctx, &id).unwrap().unwrap();

        assert_eq!(task.title, "Design");
        assert_eq!(task.project_id, project_id);
        assert_eq!(task.assigned_to, "u1");
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn time_entry_round_trip_keeps_timestamps() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let (project_id, task_id) = seed_task(&db, &ctx);
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 15, 30).unwrap();
        let input = NewTimeEntry {
            end_time: Some(start + Duration::minutes(45)),
            duration: Some(45),
            is_active: false,
            ..open_entry(&task_id, &project_id, start)
        };

        let id = db.create_time_entry(&ctx, &input).unwrap();
        let entry = db.get_time_entry(&ctx, &id).unwrap().unwrap();

        assert_eq!(entry.start_time, start);
        assert_eq!(entry.end_time, Some(start + Duration::minutes(45)));
        assert_eq!(entry.duration, Some(45));
        assert_eq!(entry.task_id, task_id);
        assert_eq!(entry.project_id, project_id);
        assert_eq!(entry.user_id, "u1");
        assert!(!entry.is_active);
    }

    #[test]
    fn records_are_scoped_to_their_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = user("u1");
        let other = user("u2");
        let (project_id, task_id) = seed_task(&db, &owner);

        assert!(db.get_project(&other, &project_id).unwrap().is_none());
        assert!(db.get_task(&other, &task_id).unwrap().is_none());
        assert!(db.list_projects(&other).unwrap().is_empty());
        assert!(matches!(
            db.delete_project(&other, &project_id),
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(db.get_project(&owner, &project_id).unwrap().is_some());
    }

    #[test]
    fn update_merges_patch_without_touching_other_fields() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let mut input = NewProject::new("Website");
        input.description = "Company site".to_string();
        let id = db.create_project(&ctx, &input).unwrap();

        let patch = ProjectPatch {
            status: Some(ProjectStatus::Archived),
            ..ProjectPatch::default()
        };
        let updated = db.update_project(&ctx, &id, &patch).unwrap();
        assert_eq!(updated.status, ProjectStatus::Archived);

        let stored = db.get_project(&ctx, &id).unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.name, "Website");
        assert_eq!(stored.description, "Company site");
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_task(&user("u1"), "nope", &TaskPatch::default())
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { kind: "Task", .. }));
    }

    #[test]
    fn lists_are_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let (project_id, task_id) = seed_task(&db, &ctx);
        let base = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        for hours in [0, 2, 1] {
            let start = base + Duration::hours(hours);
            let entry = NewTimeEntry {
                end_time: Some(start),
                duration: Some(0),
                is_active: false,
                ..open_entry(&task_id, &project_id, start)
            };
            db.create_time_entry(&ctx, &entry).unwrap();
        }

        let starts: Vec<_> = db
            .list_time_entries(&ctx, None)
            .unwrap()
            .into_iter()
            .map(|e| e.start_time)
            .collect();
        assert_eq!(
            starts,
            vec![base + Duration::hours(2), base + Duration::hours(1), base]
        );
        assert_eq!(db.list_time_entries(&ctx, Some("other-task")).unwrap().len(), 0);
        assert_eq!(db.list_time_entries(&ctx, Some(&task_id)).unwrap().len(), 3);
    }

    #[test]
    fn list_tasks_filters_by_project() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let (project_id, _) = seed_task(&db, &ctx);
        let other_project = db.create_project(&ctx, &NewProject::new("Internal")).unwrap();
        db.create_task(&ctx, &NewTask::new("Payroll", other_project.clone()))
            .unwrap();

        assert_eq!(db.list_tasks(&ctx, None).unwrap().len(), 2);
        let website_tasks = db.list_tasks(&ctx, Some(&project_id)).unwrap();
        assert_eq!(website_tasks.len(), 1);
        assert_eq!(website_tasks[0].title, "Design");
    }

    #[test]
    fn guard_rejects_second_active_entry() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let (project_id, task_id) = seed_task(&db, &ctx);
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

        db.create_time_entry(&ctx, &open_entry(&task_id, &project_id, start))
            .unwrap();
        let second = db.create_time_entry(&ctx, &open_entry(&task_id, &project_id, start));
        assert!(matches!(second, Err(DatabaseError::ActiveEntryExists)));

        // Another user is unaffected
        let other = user("u2");
        db.create_time_entry(&other, &open_entry(&task_id, &project_id, start))
            .unwrap();
    }

    #[test]
    fn without_guard_two_active_entries_can_exist() {
        let db = Database::open_in_memory().unwrap();
        db.set_single_active_guard(false).unwrap();
        let ctx = user("u1");
        let (project_id, task_id) = seed_task(&db, &ctx);
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

        db.create_time_entry(&ctx, &open_entry(&task_id, &project_id, start))
            .unwrap();
        db.create_time_entry(&ctx, &open_entry(&task_id, &project_id, start))
            .unwrap();

        let active = db
            .list_time_entries(&ctx, None)
            .unwrap()
            .into_iter()
            .filter(|e| e.is_active)
            .count();
        assert_eq!(active, 2);
    }

    #[test]
    fn closed_entry_cannot_be_reopened() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let (project_id, task_id) = seed_task(&db, &ctx);
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let id = db
            .create_time_entry(&ctx, &open_entry(&task_id, &project_id, start))
            .unwrap();
        db.update_time_entry(&ctx, &id, &TimeEntryPatch::close(start + Duration::minutes(5), 5))
            .unwrap();

        let reopen = TimeEntryPatch {
            is_active: Some(true),
            ..TimeEntryPatch::default()
        };
        assert!(matches!(
            db.update_time_entry(&ctx, &id, &reopen),
            Err(DatabaseError::Reopen(_))
        ));
        assert!(db.get_active_time_entry(&ctx).unwrap().is_none());
    }

    #[test]
    fn time_logs_filter_by_range_after_fetch() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let (project_id, task_id) = seed_task(&db, &ctx);
        for day in [1, 5, 9] {
            let log = NewTimeLog {
                task_id: task_id.clone(),
                project_id: project_id.clone(),
                date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
                hours: 1,
                minutes: 15,
                description: "review".to_string(),
            };
            db.create_time_log(&ctx, &log).unwrap();
        }

        let all = db.list_time_logs(&ctx, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2024, 4, 9).unwrap());
        assert_eq!(all[0].total_minutes(), 75);

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 9).unwrap(),
        )
        .unwrap();
        let ranged = db.list_time_logs(&ctx, Some(range)).unwrap();
        assert_eq!(ranged.len(), 2);

        db.delete_time_log(&ctx, &ranged[0].id).unwrap();
        assert!(db.get_time_log(&ctx, &ranged[0].id).unwrap().is_none());
    }

    #[test]
    fn time_log_update_merges_and_rechecks_minutes() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let (project_id, task_id) = seed_task(&db, &ctx);
        let id = db
            .create_time_log(
                &ctx,
                &NewTimeLog {
                    task_id: task_id.clone(),
                    project_id,
                    date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                    hours: 1,
                    minutes: 15,
                    description: "review".to_string(),
                },
            )
            .unwrap();

        let patch = TimeLogPatch {
            minutes: Some(45),
            date: Some(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()),
            ..TimeLogPatch::default()
        };
        let updated = db.update_time_log(&ctx, &id, &patch).unwrap();
        assert_eq!(updated.total_minutes(), 105);
        assert_eq!(updated.description, "review");
        assert_eq!(updated.task_id, task_id);
        assert_eq!(db.get_time_log(&ctx, &id).unwrap(), Some(updated.clone()));

        let bad = TimeLogPatch {
            minutes: Some(60),
            ..TimeLogPatch::default()
        };
        assert!(matches!(
            db.update_time_log(&ctx, &id, &bad),
            Err(DatabaseError::Validation(ValidationError::OutOfRange { field: "minutes", .. }))
        ));
        assert_eq!(db.get_time_log(&ctx, &id).unwrap(), Some(updated));

        let other = user("u2");
        let hidden = db.update_time_log(&other, &id, &TimeLogPatch::default());
        assert!(matches!(hidden, Err(DatabaseError::NotFound { kind: "Time log", .. })));
    }

    #[test]
    fn invalid_time_log_is_rejected_before_write() {
        let db = Database::open_in_memory().unwrap();
        let ctx = user("u1");
        let log = NewTimeLog {
            task_id: "t1".to_string(),
            project_id: "p1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            hours: 0,
            minutes: 75,
            description: "review".to_string(),
        };
        assert!(matches!(
            db.create_time_log(&ctx, &log),
            Err(DatabaseError::Validation(_))
        ));
        assert!(db.list_time_logs(&ctx, None).unwrap().is_empty());
    }
}
