//! Task bookkeeping that sits beside the lifecycle: creating tasks, putting
//! them into sprints, and editing status and subtasks.

use super::completion::ensure_open_target;
use super::service::SprintService;
use crate::error::{Result, SprintError};
use crate::model::{Subtask, Task, TaskStatus};
use crate::validation;
use serde::{Deserialize, Serialize};

/// Input for a new task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub project: String,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub sprint: Option<String>,

    #[serde(default)]
    pub story_points: Option<u32>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub subtasks: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            project: project.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn in_sprint(mut self, sprint_id: impl Into<String>) -> Self {
        self.sprint = Some(sprint_id.into());
        self
    }

    pub fn with_story_points(mut self, points: u32) -> Self {
        self.story_points = Some(points);
        self
    }

    pub fn with_subtask(mut self, title: impl Into<String>) -> Self {
        self.subtasks.push(title.into());
        self
    }
}

impl SprintService {
    pub fn create_task(&self, input: &NewTask) -> Result<Task> {
        validation::validate_title(&input.title)?;
        validation::validate_project(&input.project)?;
        for title in &input.subtasks {
            validation::validate_title(title)?;
        }
        if let Some(description) = &input.description {
            validation::validate_body(description)?;
        }
        if let Some(sprint_id) = &input.sprint {
            self.check_assignable(&input.project, sprint_id)?;
        }

        let id = self.tasks.next_task_id()?;
        let task = Task::new(id, input.title.trim().to_string(), input.project.clone())
            .with_status(input.status.clone().unwrap_or_default())
            .with_sprint(input.sprint.clone())
            .with_story_points(input.story_points)
            .with_description(input.description.clone().unwrap_or_default())
            .with_subtasks(
                input
                    .subtasks
                    .iter()
                    .map(|t| Subtask::new(t.trim().to_string(), TaskStatus::todo()))
                    .collect(),
            );

        let task = self.tasks.insert_task(&task)?;
        tracing::info!(task = %task.id, sprint = ?task.sprint, "Created task");
        Ok(task)
    }

    pub fn get_task(&self, task_id: &str) -> Result<Task> {
        self.tasks
            .find_task_by_id(task_id)?
            .ok_or_else(|| SprintError::NotFound(format!("Task {}", task_id)))
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.tasks.list_tasks()
    }

    /// Unarchived tasks that belong to no sprint.
    pub fn backlog(&self) -> Result<Vec<Task>> {
        let mut tasks = self.tasks.list_tasks()?;
        tasks.retain(|t| t.is_in_backlog() && !t.archived);
        Ok(tasks)
    }

    /// Puts a task into a planning or active sprint of the same project.
    /// Provenance fields are left as the last migration wrote them.
    pub fn assign_task(&self, task_id: &str, sprint_id: &str) -> Result<Task> {
        let mut task = self.get_task(task_id)?;
        if task.archived {
            return Err(SprintError::InvalidState(format!(
                "Task {} is archived",
                task.id
            )));
        }
        if task.sprint.as_deref() == Some(sprint_id) {
            return Ok(task);
        }
        self.check_assignable(&task.project, sprint_id)?;

        task.sprint = Some(sprint_id.to_string());
        task.touch();
        let task = self.tasks.save_task(&task)?;
        tracing::info!(task = %task.id, sprint = %sprint_id, "Assigned task to sprint");
        Ok(task)
    }

    pub fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let mut task = self.get_task(task_id)?;
        if task.status == status {
            return Ok(task);
        }
        task.status = status;
        task.touch();
        self.tasks.save_task(&task)
    }

    pub fn add_subtask(&self, task_id: &str, title: &str) -> Result<Task> {
        validation::validate_title(title)?;
        let mut task = self.get_task(task_id)?;
        task.subtasks
            .push(Subtask::new(title.trim().to_string(), TaskStatus::todo()));
        task.touch();
        self.tasks.save_task(&task)
    }

    /// `index` is zero-based, in the order subtasks were added.
    pub fn set_subtask_status(
        &self,
        task_id: &str,
        index: usize,
        status: TaskStatus,
    ) -> Result<Task> {
        let mut task = self.get_task(task_id)?;
        let count = task.subtasks.len();
        let subtask = task.subtasks.get_mut(index).ok_or_else(|| {
            SprintError::NotFound(format!(
                "Subtask {} of task {} ({} subtasks)",
                index, task_id, count
            ))
        })?;
        subtask.set_status(status);
        task.touch();
        self.tasks.save_task(&task)
    }

    /// Archived tasks keep their sprint so they still count toward its
    /// snapshot, but they are never offered for migration.
    pub fn archive_task(&self, task_id: &str) -> Result<Task> {
        let mut task = self.get_task(task_id)?;
        if task.archived {
            return Ok(task);
        }
        task.archived = true;
        task.touch();
        let task = self.tasks.save_task(&task)?;
        tracing::info!(task = %task.id, "Archived task");
        Ok(task)
    }

    fn check_assignable(&self, project: &str, sprint_id: &str) -> Result<()> {
        let sprint = self
            .sprints
            .find_sprint_by_id(sprint_id)?
            .ok_or_else(|| SprintError::NotFound(format!("Sprint {}", sprint_id)))?;
        if !sprint.is_open() {
            return Err(SprintError::InvalidTarget(format!(
                "Sprint {} is {}; tasks can only join planning or active sprints",
                sprint.id, sprint.status
            )));
        }
        if sprint.project != project {
            return Err(SprintError::InvalidTarget(format!(
                "Sprint {} belongs to project {}, not {}",
                sprint.id, sprint.project, project
            )));
        }
        Ok(())
    }
}
