use super::types::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A checklist item. `is_completed` is always derived from `status`, including
/// when a subtask is read back from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SubtaskRecord")]
pub struct Subtask {
    pub title: String,
    pub status: TaskStatus,
    pub is_completed: bool,
}

/// Stored form of a subtask. Older files may carry only one of the two fields.
#[derive(Deserialize)]
struct SubtaskRecord {
    title: String,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    is_completed: bool,
}

impl From<SubtaskRecord> for Subtask {
    fn from(record: SubtaskRecord) -> Self {
        let status = match record.status {
            Some(status) => status,
            None if record.is_completed => TaskStatus::done(),
            None => TaskStatus::default(),
        };
        Subtask::new(record.title, status)
    }
}

impl Subtask {
    pub fn new(title: String, status: TaskStatus) -> Self {
        let is_completed = status.is_complete();
        Self {
            title,
            status,
            is_completed,
        }
    }

    /// Keeps `is_completed` in lockstep with the status.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.is_completed = status.is_complete();
        self.status = status;
    }

    pub fn is_incomplete(&self) -> bool {
        !self.status.is_complete() && !self.is_completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub project: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub archived: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_from_sprint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_to_sprint: Option<String>,

    #[serde(default)]
    pub moved_to_backlog: bool,

    #[serde(default)]
    pub created: DateTime<Utc>,

    #[serde(default)]
    pub updated: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,

    #[serde(skip)]
    pub description: String,
}

impl Task {
    pub fn new(id: String, title: String, project: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            project,
            sprint: None,
            status: TaskStatus::default(),
            archived: false,
            story_points: None,
            moved_from_sprint: None,
            moved_to_sprint: None,
            moved_to_backlog: false,
            created: now,
            updated: now,
            subtasks: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_sprint(mut self, sprint: Option<String>) -> Self {
        self.sprint = sprint;
        self
    }

    pub fn with_story_points(mut self, points: Option<u32>) -> Self {
        self.story_points = points;
        self
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = subtasks;
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    pub fn is_in_backlog(&self) -> bool {
        self.sprint.is_none()
    }

    pub fn incomplete_subtasks(&self) -> Vec<Subtask> {
        self.subtasks
            .iter()
            .filter(|s| s.is_incomplete())
            .cloned()
            .collect()
    }
}

/// The four fields a sprint migration is allowed to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintAssignment {
    pub sprint: Option<String>,
    pub moved_from_sprint: Option<String>,
    pub moved_to_sprint: Option<String>,
    pub moved_to_backlog: bool,
}

impl SprintAssignment {
    pub fn to_backlog(from_sprint: &str) -> Self {
        Self {
            sprint: None,
            moved_from_sprint: Some(from_sprint.to_string()),
            moved_to_sprint: None,
            moved_to_backlog: true,
        }
    }

    pub fn to_sprint(from_sprint: &str, to_sprint: &str) -> Self {
        Self {
            sprint: Some(to_sprint.to_string()),
            moved_from_sprint: Some(from_sprint.to_string()),
            moved_to_sprint: Some(to_sprint.to_string()),
            moved_to_backlog: false,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.sprint == self.sprint
            && task.moved_from_sprint == self.moved_from_sprint
            && task.moved_to_sprint == self.moved_to_sprint
            && task.moved_to_backlog == self.moved_to_backlog
    }

    /// True while `task` can take this assignment: it is still in the sprint
    /// being left, or it already carries the assignment.
    pub fn applies_to(&self, task: &Task) -> bool {
        self.matches(task) || task.sprint == self.moved_from_sprint
    }

    /// Writes the assignment into `task`. Returns false, leaving the task
    /// untouched, when it already carries exactly this assignment.
    pub fn apply(&self, task: &mut Task) -> bool {
        if self.matches(task) {
            return false;
        }
        task.sprint = self.sprint.clone();
        task.moved_from_sprint = self.moved_from_sprint.clone();
        task.moved_to_sprint = self.moved_to_sprint.clone();
        task.moved_to_backlog = self.moved_to_backlog;
        task.touch();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtask_completion_follows_status() {
        let mut sub = Subtask::new("write docs".into(), TaskStatus::todo());
        assert!(!sub.is_completed);
        assert!(sub.is_incomplete());

        sub.set_status(TaskStatus::new("completed"));
        assert!(sub.is_completed);
        assert!(!sub.is_incomplete());

        sub.set_status(TaskStatus::new("review"));
        assert!(!sub.is_completed);
    }

    #[test]
    fn test_incomplete_subtasks() {
        let task = Task::new("tk-1".into(), "Login".into(), "web".into()).with_subtasks(vec![
            Subtask::new("form".into(), TaskStatus::done()),
            Subtask::new("api".into(), TaskStatus::new("in_progress")),
        ]);
        let open = task.incomplete_subtasks();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "api");
    }

    #[test]
    fn test_assignment_apply_is_idempotent() {
        let mut task = Task::new("tk-1".into(), "Login".into(), "web".into())
            .with_sprint(Some("sp-1".into()));
        let assignment = SprintAssignment::to_backlog("sp-1");

        assert!(assignment.apply(&mut task));
        let after_first = task.clone();

        assert!(!assignment.apply(&mut task));
        assert_eq!(task, after_first);
        assert!(task.is_in_backlog());
        assert!(task.moved_to_backlog);
        assert_eq!(task.moved_from_sprint.as_deref(), Some("sp-1"));
    }

    #[test]
    fn test_assignment_to_sprint_leaves_status_and_subtasks() {
        let subtasks = vec![Subtask::new("api".into(), TaskStatus::todo())];
        let mut task = Task::new("tk-1".into(), "Login".into(), "web".into())
            .with_sprint(Some("sp-1".into()))
            .with_status(TaskStatus::new("review"))
            .with_subtasks(subtasks.clone());

        SprintAssignment::to_sprint("sp-1", "sp-2").apply(&mut task);

        assert_eq!(task.sprint.as_deref(), Some("sp-2"));
        assert_eq!(task.moved_to_sprint.as_deref(), Some("sp-2"));
        assert!(!task.moved_to_backlog);
        assert_eq!(task.status, TaskStatus::new("review"));
        assert_eq!(task.subtasks, subtasks);
        assert_eq!(task.title, "Login");
    }

    #[test]
    fn test_subtask_flag_derived_on_load() {
        let done: Subtask = serde_json::from_str(r#"{"title": "docs", "status": "done"}"#).unwrap();
        assert!(done.is_completed);

        let stale: Subtask =
            serde_json::from_str(r#"{"title": "docs", "status": "todo", "is_completed": true}"#)
                .unwrap();
        assert!(!stale.is_completed);
        assert!(stale.is_incomplete());

        let flag_only: Subtask =
            serde_json::from_str(r#"{"title": "docs", "is_completed": true}"#).unwrap();
        assert_eq!(flag_only.status, TaskStatus::done());
    }
}
