use crate::error::{Result, SprintError};
use crate::model::{Sprint, SprintAssignment, SprintPatch, SprintStatus, Task};

/// Persistence for sprint aggregates.
pub trait SprintStore: Send + Sync {
    fn find_sprint_by_id(&self, id: &str) -> Result<Option<Sprint>>;

    /// All sprints, oldest first, optionally limited to one project.
    fn list_sprints(&self, project: Option<&str>) -> Result<Vec<Sprint>>;

    fn insert_sprint(&self, sprint: &Sprint) -> Result<Sprint>;

    /// Applies `patch` only if the stored sprint is still in `expected` status.
    ///
    /// Returns `SprintError::Conflict` when another writer changed the status
    /// first and `SprintError::NotFound` when the sprint is gone.
    fn update_sprint_status(
        &self,
        id: &str,
        expected: SprintStatus,
        patch: &SprintPatch,
    ) -> Result<Sprint>;

    fn next_sprint_id(&self) -> Result<String>;

    /// Takes the exclusive completion lease on a sprint. While one caller holds
    /// it, every other caller gets `SprintError::Conflict`, including callers
    /// in other processes sharing the same data directory.
    fn acquire_completion_lease(&self, id: &str) -> Result<()>;

    fn release_completion_lease(&self, id: &str) -> Result<()>;
}

/// Persistence for task aggregates.
pub trait TaskStore: Send + Sync {
    fn find_task_by_id(&self, id: &str) -> Result<Option<Task>>;

    /// Tasks currently assigned to `sprint_id`, archived ones included.
    ///
    /// Fails rather than returning a partial list when a task that may belong
    /// to the sprint cannot be read.
    fn find_tasks_by_sprint(&self, sprint_id: &str) -> Result<Vec<Task>>;

    /// Writes only the sprint membership and provenance fields, and only while
    /// the task still sits in `assignment.moved_from_sprint`. The check and the
    /// write happen under one lock. Stores skip the write when the task already
    /// carries the assignment and return `SprintError::Conflict` when the task
    /// has moved elsewhere.
    fn update_task_sprint_assignment(&self, id: &str, assignment: &SprintAssignment)
    -> Result<Task>;

    fn insert_task(&self, task: &Task) -> Result<Task>;

    /// Replaces a task wholesale. Used for edits outside the lifecycle (status,
    /// subtasks, archiving).
    fn save_task(&self, task: &Task) -> Result<Task>;

    fn list_tasks(&self) -> Result<Vec<Task>>;

    fn next_task_id(&self) -> Result<String>;
}

pub(crate) fn left_sprint(id: &str, assignment: &SprintAssignment) -> SprintError {
    SprintError::Conflict(format!(
        "Task {} is no longer in sprint {}",
        id,
        assignment.moved_from_sprint.as_deref().unwrap_or("(none)")
    ))
}

/// Sorts aggregates oldest first, breaking ties on id so listings are stable.
pub(crate) fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
}

pub(crate) fn sort_sprints(sprints: &mut [Sprint]) {
    sprints.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.created.cmp(&b.created))
            .then_with(|| a.id.cmp(&b.id))
    });
}
