use crate::database::DatabaseError;
use crate::models::{
    DateRange, NewProject, NewTask, NewTimeEntry, NewTimeLog, Project, ProjectPatch, Task,
    TaskPatch, TimeEntry, TimeEntryPatch, TimeLog, TimeLogPatch, UserContext,
};

/// Typed CRUD over the record store.
///
/// Every call is scoped to the caller's [`UserContext`]: records owned by
/// someone else read as missing and cannot be updated or deleted. Creates
/// return the store-assigned id. Updates take a patch and merge it onto the
/// stored record, returning the merged result. Each write touches a single
/// record atomically; nothing spans records.
pub trait Gateway {
    fn create_project(
        &self,
        ctx: &UserContext,
        project: &NewProject,
    ) -> Result<String, DatabaseError>;
    fn get_project(&self, ctx: &UserContext, id: &str) -> Result<Option<Project>, DatabaseError>;
    /// Newest first
    fn list_projects(&self, ctx: &UserContext) -> Result<Vec<Project>, DatabaseError>;
    fn update_project(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &ProjectPatch,
    ) -> Result<Project, DatabaseError>;
    fn delete_project(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError>;

    fn create_task(&self, ctx: &UserContext, task: &NewTask) -> Result<String, DatabaseError>;
    fn get_task(&self, ctx: &UserContext, id: &str) -> Result<Option<Task>, DatabaseError>;
    /// Newest first, optionally limited to one project
    fn list_tasks(
        &self,
        ctx: &UserContext,
        project_id: Option<&str>,
    ) -> Result<Vec<Task>, DatabaseError>;
    fn update_task(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, DatabaseError>;
    fn delete_task(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError>;

    fn create_time_entry(
        &self,
        ctx: &UserContext,
        entry: &NewTimeEntry,
    ) -> Result<String, DatabaseError>;
    fn get_time_entry(
        &self,
        ctx: &UserContext,
        id: &str,
    ) -> Result<Option<TimeEntry>, DatabaseError>;
    /// Newest first by start time, optionally limited to one task
    fn list_time_entries(
        &self,
        ctx: &UserContext,
        task_id: Option<&str>,
    ) -> Result<Vec<TimeEntry>, DatabaseError>;
    /// The user's open entry, if any
    fn get_active_time_entry(&self, ctx: &UserContext) -> Result<Option<TimeEntry>, DatabaseError>;
    fn update_time_entry(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &TimeEntryPatch,
    ) -> Result<TimeEntry, DatabaseError>;
    fn delete_time_entry(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError>;

    fn create_time_log(&self, ctx: &UserContext, log: &NewTimeLog) -> Result<String, DatabaseError>;
    fn get_time_log(&self, ctx: &UserContext, id: &str) -> Result<Option<TimeLog>, DatabaseError>;
    /// Newest first by date, optionally restricted to an inclusive range
    fn list_time_logs(
        &self,
        ctx: &UserContext,
        range: Option<DateRange>,
    ) -> Result<Vec<TimeLog>, DatabaseError>;
    fn update_time_log(
        &self,
        ctx: &UserContext,
        id: &str,
        patch: &TimeLogPatch,
    ) -> Result<TimeLog, DatabaseError>;
    fn delete_time_log(&self, ctx: &UserContext, id: &str) -> Result<(), DatabaseError>;
}
