use crate::error::{Result, SprintError};
use crate::model::{SprintAssignment, Task};
use crate::storage::TaskStore;
use serde::Serialize;

/// Where an unfinished task goes when its sprint closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "sprint", rename_all = "lowercase")]
pub enum MigrationTarget {
    Backlog,
    Sprint(String),
}

impl MigrationTarget {
    fn assignment(&self, from_sprint: &str) -> SprintAssignment {
        match self {
            MigrationTarget::Backlog => SprintAssignment::to_backlog(from_sprint),
            MigrationTarget::Sprint(to) => SprintAssignment::to_sprint(from_sprint, to),
        }
    }
}

impl std::fmt::Display for MigrationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationTarget::Backlog => write!(f, "backlog"),
            MigrationTarget::Sprint(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Moved(Task),
    /// The task was no longer in the sprint being closed (or no longer exists).
    Skipped,
}

/// Reassigns one task's sprint membership and stamps provenance.
pub struct MigrationExecutor<'a> {
    tasks: &'a dyn TaskStore,
}

impl<'a> MigrationExecutor<'a> {
    pub fn new(tasks: &'a dyn TaskStore) -> Self {
        Self { tasks }
    }

    /// Moves a task out of `from_sprint`. Repeating it with the same arguments
    /// writes nothing; a task that has since landed elsewhere is refused with
    /// `SprintError::Conflict`.
    pub fn move_task(
        &self,
        task_id: &str,
        from_sprint: &str,
        target: &MigrationTarget,
    ) -> Result<Task> {
        if let MigrationTarget::Sprint(to) = target
            && to == from_sprint
        {
            return Err(SprintError::InvalidTarget(format!(
                "Task {} cannot move from sprint {} into itself",
                task_id, from_sprint
            )));
        }
        self.tasks
            .update_task_sprint_assignment(task_id, &target.assignment(from_sprint))
    }

    /// Moves the task only if it is still assigned to `from_sprint`.
    ///
    /// Assignment is re-read before the write, and the store checks it again
    /// under its own lock, so a task reassigned by someone else since the
    /// caller's snapshot is left alone.
    pub fn move_if_assigned(
        &self,
        task_id: &str,
        from_sprint: &str,
        target: &MigrationTarget,
    ) -> Result<MoveOutcome> {
        let current = self.tasks.find_task_by_id(task_id)?;
        match current {
            Some(task) if task.sprint.as_deref() == Some(from_sprint) => {
                match self.move_task(task_id, from_sprint, target) {
                    Ok(moved) => {
                        tracing::debug!(task = %task_id, from = %from_sprint, to = %target, "Migrated task");
                        Ok(MoveOutcome::Moved(moved))
                    }
                    // Reassigned between the read and the write.
                    Err(SprintError::Conflict(reason)) => {
                        tracing::debug!(task = %task_id, %reason, "Skipping task that left the sprint");
                        Ok(MoveOutcome::Skipped)
                    }
                    Err(e) => Err(e),
                }
            }
            Some(task) => {
                tracing::debug!(
                    task = %task_id,
                    from = %from_sprint,
                    now_in = ?task.sprint,
                    "Skipping task that already left the sprint"
                );
                Ok(MoveOutcome::Skipped)
            }
            None => {
                tracing::debug!(task = %task_id, "Skipping task that no longer exists");
                Ok(MoveOutcome::Skipped)
            }
        }
    }
}
