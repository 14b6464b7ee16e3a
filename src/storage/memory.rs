use super::store::{SprintStore, TaskStore, left_sprint, sort_sprints, sort_tasks};
use crate::error::{Result, SprintError};
use crate::model::{Sprint, SprintAssignment, SprintPatch, SprintStatus, Task};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    sprints: HashMap<String, Sprint>,
    tasks: HashMap<String, Task>,
    sprint_seq: u64,
    task_seq: u64,
    leases: HashSet<String>,
}

/// In-process store backing both traits. Every operation takes one lock, so a
/// status compare-and-set is atomic with respect to other callers.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| SprintError::Storage("Memory store lock poisoned".to_string()))
    }
}

impl SprintStore for MemoryStore {
    fn find_sprint_by_id(&self, id: &str) -> Result<Option<Sprint>> {
        Ok(self.lock()?.sprints.get(id).cloned())
    }

    fn list_sprints(&self, project: Option<&str>) -> Result<Vec<Sprint>> {
        let mut sprints: Vec<Sprint> = self
            .lock()?
            .sprints
            .values()
            .filter(|s| project.is_none_or(|p| s.project == p))
            .cloned()
            .collect();
        sort_sprints(&mut sprints);
        Ok(sprints)
    }

    fn insert_sprint(&self, sprint: &Sprint) -> Result<Sprint> {
        let mut tables = self.lock()?;
        if tables.sprints.contains_key(&sprint.id) {
            return Err(SprintError::Storage(format!(
                "Sprint {} already exists",
                sprint.id
            )));
        }
        tables.sprints.insert(sprint.id.clone(), sprint.clone());
        Ok(sprint.clone())
    }

    fn update_sprint_status(
        &self,
        id: &str,
        expected: SprintStatus,
        patch: &SprintPatch,
    ) -> Result<Sprint> {
        let mut tables = self.lock()?;
        let sprint = tables
            .sprints
            .get_mut(id)
            .ok_or_else(|| SprintError::NotFound(format!("Sprint {}", id)))?;
        if sprint.status != expected {
            return Err(SprintError::Conflict(format!(
                "Sprint {} is {} (expected {})",
                id, sprint.status, expected
            )));
        }
        patch.apply(sprint);
        Ok(sprint.clone())
    }

    fn next_sprint_id(&self) -> Result<String> {
        let mut tables = self.lock()?;
        tables.sprint_seq += 1;
        Ok(format!("sp-{}", tables.sprint_seq))
    }

    fn acquire_completion_lease(&self, id: &str) -> Result<()> {
        if !self.lock()?.leases.insert(id.to_string()) {
            return Err(SprintError::Conflict(format!(
                "Sprint {} is already being completed",
                id
            )));
        }
        Ok(())
    }

    fn release_completion_lease(&self, id: &str) -> Result<()> {
        self.lock()?.leases.remove(id);
        Ok(())
    }
}

impl TaskStore for MemoryStore {
    fn find_task_by_id(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.lock()?.tasks.get(id).cloned())
    }

    fn find_tasks_by_sprint(&self, sprint_id: &str) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .lock()?
            .tasks
            .values()
            .filter(|t| t.sprint.as_deref() == Some(sprint_id))
            .cloned()
            .collect();
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    fn update_task_sprint_assignment(
        &self,
        id: &str,
        assignment: &SprintAssignment,
    ) -> Result<Task> {
        let mut tables = self.lock()?;
        let task = tables
            .tasks
            .get_mut(id)
            .ok_or_else(|| SprintError::NotFound(format!("Task {}", id)))?;
        if !assignment.applies_to(task) {
            return Err(left_sprint(id, assignment));
        }
        assignment.apply(task);
        Ok(task.clone())
    }

    fn insert_task(&self, task: &Task) -> Result<Task> {
        let mut tables = self.lock()?;
        if tables.tasks.contains_key(&task.id) {
            return Err(SprintError::Storage(format!(
                "Task {} already exists",
                task.id
            )));
        }
        tables.tasks.insert(task.id.clone(), task.clone());
        Ok(task.clone())
    }

    fn save_task(&self, task: &Task) -> Result<Task> {
        let mut tables = self.lock()?;
        if !tables.tasks.contains_key(&task.id) {
            return Err(SprintError::NotFound(format!("Task {}", task.id)));
        }
        tables.tasks.insert(task.id.clone(), task.clone());
        Ok(task.clone())
    }

    fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.lock()?.tasks.values().cloned().collect();
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    fn next_task_id(&self) -> Result<String> {
        let mut tables = self.lock()?;
        tables.task_seq += 1;
        Ok(format!("tk-{}", tables.task_seq))
    }
}
