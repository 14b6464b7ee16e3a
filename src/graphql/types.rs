use crate::error::SprintError;
use crate::lifecycle::{self, NewTask, SprintSpec};
use crate::model;
use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
pub enum SprintStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl From<model::SprintStatus> for SprintStatus {
    fn from(s: model::SprintStatus) -> Self {
        match s {
            model::SprintStatus::Planning => SprintStatus::Planning,
            model::SprintStatus::Active => SprintStatus::Active,
            model::SprintStatus::Completed => SprintStatus::Completed,
            model::SprintStatus::Cancelled => SprintStatus::Cancelled,
        }
    }
}

impl From<SprintStatus> for model::SprintStatus {
    fn from(s: SprintStatus) -> Self {
        match s {
            SprintStatus::Planning => model::SprintStatus::Planning,
            SprintStatus::Active => model::SprintStatus::Active,
            SprintStatus::Completed => model::SprintStatus::Completed,
            SprintStatus::Cancelled => model::SprintStatus::Cancelled,
        }
    }
}

fn timestamp(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|t| t.to_rfc3339())
}

#[derive(SimpleObject)]
pub struct Progress {
    pub tasks_completed: usize,
    pub total_tasks: usize,
    pub story_points_completed: u32,
    pub total_story_points: u32,
    pub completion_ratio: f64,
}

impl From<model::ProgressSnapshot> for Progress {
    fn from(s: model::ProgressSnapshot) -> Self {
        Self {
            tasks_completed: s.tasks_completed,
            total_tasks: s.total_tasks,
            story_points_completed: s.story_points_completed,
            total_story_points: s.total_story_points,
            completion_ratio: s.completion_ratio(),
        }
    }
}

#[derive(SimpleObject)]
pub struct Sprint {
    pub id: String,
    pub project: String,
    pub name: String,
    pub status: SprintStatus,
    pub start_date: String,
    pub end_date: String,
    pub actual_start: Option<String>,
    pub actual_end: Option<String>,
    pub capacity: f64,
    pub goal: String,
    /// Frozen at completion
    pub snapshot: Option<Progress>,
    pub created: String,
    pub updated: String,
}

impl From<model::Sprint> for Sprint {
    fn from(s: model::Sprint) -> Self {
        Self {
            id: s.id,
            project: s.project,
            name: s.name,
            status: s.status.into(),
            start_date: s.start_date.to_string(),
            end_date: s.end_date.to_string(),
            actual_start: timestamp(s.actual_start),
            actual_end: timestamp(s.actual_end),
            capacity: s.capacity,
            goal: s.goal,
            snapshot: s.snapshot.map(Into::into),
            created: s.created.to_rfc3339(),
            updated: s.updated.to_rfc3339(),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct Subtask {
    pub title: String,
    pub status: String,
    pub is_completed: bool,
}

impl From<model::Subtask> for Subtask {
    fn from(s: model::Subtask) -> Self {
        Self {
            title: s.title,
            status: s.status.as_str().to_string(),
            is_completed: s.is_completed,
        }
    }
}

#[derive(SimpleObject)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub project: String,
    pub sprint: Option<String>,
    pub status: String,
    pub is_complete: bool,
    pub archived: bool,
    pub story_points: Option<u32>,
    pub moved_from_sprint: Option<String>,
    pub moved_to_sprint: Option<String>,
    pub moved_to_backlog: bool,
    pub subtasks: Vec<Subtask>,
    pub description: String,
    pub updated: String,
}

impl From<model::Task> for Task {
    fn from(t: model::Task) -> Self {
        Self {
            is_complete: t.is_complete(),
            id: t.id,
            title: t.title,
            project: t.project,
            sprint: t.sprint,
            status: t.status.as_str().to_string(),
            archived: t.archived,
            story_points: t.story_points,
            moved_from_sprint: t.moved_from_sprint,
            moved_to_sprint: t.moved_to_sprint,
            moved_to_backlog: t.moved_to_backlog,
            subtasks: t.subtasks.into_iter().map(Into::into).collect(),
            description: t.description,
            updated: t.updated.to_rfc3339(),
        }
    }
}

#[derive(SimpleObject)]
pub struct IncompleteTask {
    pub task_id: String,
    pub title: String,
    pub status: String,
    pub subtasks: Vec<Subtask>,
    pub incomplete_subtasks: Vec<Subtask>,
}

impl From<lifecycle::IncompleteTask> for IncompleteTask {
    fn from(t: lifecycle::IncompleteTask) -> Self {
        Self {
            task_id: t.task_id,
            title: t.title,
            status: t.status.as_str().to_string(),
            subtasks: t.subtasks.into_iter().map(Into::into).collect(),
            incomplete_subtasks: t.incomplete_subtasks.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(SimpleObject)]
pub struct CompletionResult {
    pub sprint: Sprint,
    pub created_sprint: Option<Sprint>,
    pub moved_to_backlog: Vec<String>,
    pub moved_to_sprint: Vec<String>,
    pub skipped: Vec<String>,
    /// Tasks that could not be migrated; retry with `migrateTasks`
    pub partial_failures: Vec<String>,
}

impl From<lifecycle::CompletionReport> for CompletionResult {
    fn from(r: lifecycle::CompletionReport) -> Self {
        Self {
            sprint: r.sprint.into(),
            created_sprint: r.created_sprint.map(Into::into),
            moved_to_backlog: r.moved_to_backlog,
            moved_to_sprint: r.moved_to_sprint,
            skipped: r.skipped,
            partial_failures: r.partial_failures,
        }
    }
}

#[derive(SimpleObject)]
pub struct MigrationResult {
    pub moved: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl From<lifecycle::MigrationSummary> for MigrationResult {
    fn from(s: lifecycle::MigrationSummary) -> Self {
        Self {
            moved: s.moved,
            skipped: s.skipped,
            failed: s.failed,
        }
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, SprintError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        SprintError::Validation(format!("{} must be a YYYY-MM-DD date, got '{}'", field, value))
    })
}

#[derive(InputObject)]
pub struct SprintInput {
    /// Defaults to the configured project; inside a completion plan, to the
    /// closing sprint's project
    pub project: Option<String>,
    /// Auto-numbered when omitted
    pub name: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub capacity: Option<f64>,
    pub goal: Option<String>,
}

impl SprintInput {
    pub fn into_spec(self, default_project: &str, default_capacity: f64) -> Result<SprintSpec, SprintError> {
        let mut spec = SprintSpec::new(
            self.project.unwrap_or_else(|| default_project.to_string()),
            parse_date("startDate", &self.start_date)?,
            parse_date("endDate", &self.end_date)?,
        )
        .with_capacity(self.capacity.unwrap_or(default_capacity));
        if let Some(name) = self.name {
            spec = spec.with_name(name);
        }
        if let Some(goal) = self.goal {
            spec = spec.with_goal(goal);
        }
        Ok(spec)
    }
}

#[derive(InputObject)]
pub struct MigrationPlanInput {
    #[graphql(default)]
    pub selected_task_ids: Vec<String>,
    pub target_sprint_id: Option<String>,
    pub new_sprint: Option<SprintInput>,
}

impl MigrationPlanInput {
    pub fn into_plan(self, default_capacity: f64) -> Result<lifecycle::MigrationPlan, SprintError> {
        Ok(lifecycle::MigrationPlan {
            selected_task_ids: self.selected_task_ids.into_iter().collect(),
            target_sprint_id: self.target_sprint_id,
            new_sprint: self
                .new_sprint
                .map(|s| s.into_spec("", default_capacity))
                .transpose()?,
        })
    }
}

#[derive(InputObject)]
pub struct CreateTaskInput {
    pub title: String,
    pub project: Option<String>,
    pub sprint: Option<String>,
    pub status: Option<String>,
    pub story_points: Option<u32>,
    pub description: Option<String>,
    pub subtasks: Option<Vec<String>>,
}

impl CreateTaskInput {
    pub fn into_new_task(self, default_project: &str) -> Result<NewTask, SprintError> {
        Ok(NewTask {
            title: self.title,
            project: self.project.unwrap_or_else(|| default_project.to_string()),
            status: self.status.map(|s| s.parse::<model::TaskStatus>()).transpose()?,
            sprint: self.sprint,
            story_points: self.story_points,
            description: self.description,
            subtasks: self.subtasks.unwrap_or_default(),
        })
    }
}
