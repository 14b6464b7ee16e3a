//! Closing an active sprint.
//!
//! Every task assigned to the sprint when completion begins ends up in exactly
//! one place: still in the sprint because it is done, in the backlog, or in the
//! chosen target sprint. The snapshot is taken from that first read and frozen.

use super::events::{NotificationDispatcher, SprintEvent, dispatch};
use super::factory::{SprintFactory, SprintSpec};
use super::migration::{MigrationExecutor, MigrationTarget, MoveOutcome};
use super::state::SprintStateMachine;
use crate::error::{Result, SprintError};
use crate::model::{ProgressSnapshot, Sprint, SprintPatch, SprintStatus, Subtask, Task, TaskStatus};
use crate::storage::{SprintStore, TaskStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Caller's decision about where unfinished work goes.
///
/// Selected tasks go to `target_sprint_id`, or to a sprint created from
/// `new_sprint`. Everything else that is unfinished goes to the backlog. An empty
/// selection sends all unfinished work to the backlog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    #[serde(default)]
    pub selected_task_ids: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sprint_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_sprint: Option<SprintSpec>,
}

impl MigrationPlan {
    pub fn to_backlog() -> Self {
        Self::default()
    }

    pub fn to_sprint<I, S>(task_ids: I, target_sprint_id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_task_ids: task_ids.into_iter().map(Into::into).collect(),
            target_sprint_id: Some(target_sprint_id.into()),
            new_sprint: None,
        }
    }

    pub fn to_new_sprint<I, S>(task_ids: I, spec: SprintSpec) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_task_ids: task_ids.into_iter().map(Into::into).collect(),
            target_sprint_id: None,
            new_sprint: Some(spec),
        }
    }
}

/// An unfinished task as offered to the operator when closing a sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteTask {
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
    pub subtasks: Vec<Subtask>,
    /// Advisory only; open subtasks never block closing the sprint.
    pub incomplete_subtasks: Vec<Subtask>,
}

impl From<&Task> for IncompleteTask {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            status: task.status.clone(),
            subtasks: task.subtasks.clone(),
            incomplete_subtasks: task.incomplete_subtasks(),
        }
    }
}

/// A sprint's tasks split by completion status.
#[derive(Debug, Clone, Default)]
pub struct TaskPartition {
    pub complete: Vec<Task>,
    pub incomplete: Vec<Task>,
}

impl TaskPartition {
    pub fn new(tasks: Vec<Task>) -> Self {
        let (complete, incomplete) = tasks.into_iter().partition(|t| t.is_complete());
        Self {
            complete,
            incomplete,
        }
    }

    pub fn total(&self) -> usize {
        self.complete.len() + self.incomplete.len()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let points = |tasks: &[Task]| tasks.iter().filter_map(|t| t.story_points).sum::<u32>();
        let completed_points = points(&self.complete);
        ProgressSnapshot {
            tasks_completed: self.complete.len(),
            total_tasks: self.total(),
            story_points_completed: completed_points,
            total_story_points: completed_points + points(&self.incomplete),
        }
    }

    /// Unfinished tasks the operator may choose to carry over. Archived tasks
    /// are frozen and never offered.
    pub fn offerable(&self) -> Vec<IncompleteTask> {
        self.incomplete
            .iter()
            .filter(|t| !t.archived)
            .map(IncompleteTask::from)
            .collect()
    }
}

/// Outcome of a successful completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub sprint: Sprint,
    /// Sprint created by the plan's `new_sprint` branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_sprint: Option<Sprint>,
    pub moved_to_backlog: Vec<String>,
    pub moved_to_sprint: Vec<String>,
    /// Tasks that had already left the sprint by the time they were migrated.
    pub skipped: Vec<String>,
    /// Tasks whose migration failed; the sprint closed anyway. Safe to retry.
    pub partial_failures: Vec<String>,
    pub incomplete: Vec<IncompleteTask>,
}

impl CompletionReport {
    pub fn is_clean(&self) -> bool {
        self.partial_failures.is_empty()
    }

    pub fn partial_failure(&self) -> Option<SprintError> {
        if self.is_clean() {
            None
        } else {
            Some(SprintError::PartialFailure(self.partial_failures.clone()))
        }
    }
}

/// Plan after validation: where each selected task goes.
struct ResolvedPlan {
    selected: BTreeSet<String>,
    target: Option<String>,
    created: Option<Sprint>,
}

impl ResolvedPlan {
    fn backlog_only() -> Self {
        Self {
            selected: BTreeSet::new(),
            target: None,
            created: None,
        }
    }

    fn destination(&self, task: &Task) -> MigrationTarget {
        match &self.target {
            Some(target) if !task.archived && self.selected.contains(&task.id) => {
                MigrationTarget::Sprint(target.clone())
            }
            _ => MigrationTarget::Backlog,
        }
    }
}

/// Holds a sprint's completion lease and gives it back on drop.
struct CompletionLease<'a> {
    sprints: &'a dyn SprintStore,
    sprint_id: String,
}

impl<'a> CompletionLease<'a> {
    fn acquire(sprints: &'a dyn SprintStore, sprint_id: &str) -> Result<Self> {
        sprints.acquire_completion_lease(sprint_id)?;
        Ok(Self {
            sprints,
            sprint_id: sprint_id.to_string(),
        })
    }
}

impl Drop for CompletionLease<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.sprints.release_completion_lease(&self.sprint_id) {
            tracing::warn!(sprint = %self.sprint_id, error = %e, "Failed to release completion lease");
        }
    }
}

pub struct CompletionCoordinator<'a> {
    sprints: &'a dyn SprintStore,
    tasks: &'a dyn TaskStore,
    dispatcher: &'a dyn NotificationDispatcher,
    name_prefix: &'a str,
}

impl<'a> CompletionCoordinator<'a> {
    pub fn new(
        sprints: &'a dyn SprintStore,
        tasks: &'a dyn TaskStore,
        dispatcher: &'a dyn NotificationDispatcher,
        name_prefix: &'a str,
    ) -> Self {
        Self {
            sprints,
            tasks,
            dispatcher,
            name_prefix,
        }
    }

    /// Unfinished, non-archived tasks currently assigned to the sprint.
    pub fn incomplete_tasks(&self, sprint_id: &str) -> Result<Vec<IncompleteTask>> {
        let machine = SprintStateMachine::new(self.sprints, self.tasks);
        machine.load(sprint_id)?;
        let partition = TaskPartition::new(self.tasks.find_tasks_by_sprint(sprint_id)?);
        Ok(partition.offerable())
    }

    /// Closes an active sprint.
    ///
    /// The store's completion lease is taken before the status check and held
    /// until the terminal state is written, so a competing completion fails with
    /// `Conflict` before it reads a task or creates a sprint.
    pub fn complete(&self, sprint_id: &str, plan: Option<&MigrationPlan>) -> Result<CompletionReport> {
        let machine = SprintStateMachine::new(self.sprints, self.tasks);
        let sprint = machine.load(sprint_id)?;
        let _lease = CompletionLease::acquire(self.sprints, &sprint.id)?;
        // Re-read under the lease.
        let sprint = machine.load(sprint_id)?;
        match sprint.status {
            SprintStatus::Active => {}
            SprintStatus::Completed => {
                return Err(SprintError::Conflict(format!(
                    "Sprint {} has already been completed",
                    sprint.id
                )));
            }
            status => {
                return Err(SprintError::InvalidState(format!(
                    "Sprint {} is {}; only active sprints can be completed",
                    sprint.id, status
                )));
            }
        }

        let partition = TaskPartition::new(self.tasks.find_tasks_by_sprint(sprint_id)?);
        let snapshot = partition.snapshot();
        tracing::info!(
            sprint = %sprint.id,
            complete = partition.complete.len(),
            incomplete = partition.incomplete.len(),
            "Completing sprint"
        );

        let resolved = if partition.incomplete.is_empty() {
            ResolvedPlan::backlog_only()
        } else {
            self.resolve_plan(&sprint, plan)?
        };

        let executor = MigrationExecutor::new(self.tasks);
        let mut moved_to_backlog = Vec::new();
        let mut moved_to_sprint = Vec::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();

        for task in &partition.incomplete {
            let destination = resolved.destination(task);
            match executor.move_if_assigned(&task.id, &sprint.id, &destination) {
                Ok(MoveOutcome::Moved(_)) => match destination {
                    MigrationTarget::Backlog => moved_to_backlog.push(task.id.clone()),
                    MigrationTarget::Sprint(_) => moved_to_sprint.push(task.id.clone()),
                },
                Ok(MoveOutcome::Skipped) => skipped.push(task.id.clone()),
                Err(e) => {
                    tracing::warn!(
                        sprint = %sprint.id,
                        task = %task.id,
                        error = %e,
                        "Task migration failed"
                    );
                    failures.push(task.id.clone());
                }
            }
        }

        let completed = machine.commit(
            &sprint,
            SprintPatch::status(SprintStatus::Completed)
                .with_actual_end(Utc::now())
                .with_snapshot(snapshot),
        )?;

        dispatch(
            self.dispatcher,
            SprintEvent::SprintCompleted {
                sprint_id: completed.id.clone(),
                project: completed.project.clone(),
                tasks_completed: snapshot.tasks_completed,
                total_tasks: snapshot.total_tasks,
                moved_to_backlog: moved_to_backlog.len(),
                moved_to_sprint: moved_to_sprint.len(),
                target_sprint_id: resolved.target.clone(),
                failed: failures.clone(),
            },
        );

        if !failures.is_empty() {
            tracing::warn!(
                sprint = %completed.id,
                failed = failures.len(),
                "Sprint completed with migration failures"
            );
        }

        Ok(CompletionReport {
            sprint: completed,
            created_sprint: resolved.created,
            moved_to_backlog,
            moved_to_sprint,
            skipped,
            partial_failures: failures,
            incomplete: partition.offerable(),
        })
    }

    /// Validates the plan before anything is written. A new target sprint is
    /// created here, so a plan that fails validation creates nothing.
    fn resolve_plan(&self, closing: &Sprint, plan: Option<&MigrationPlan>) -> Result<ResolvedPlan> {
        let Some(plan) = plan else {
            return Ok(ResolvedPlan::backlog_only());
        };
        if plan.selected_task_ids.is_empty() {
            return Ok(ResolvedPlan::backlog_only());
        }

        match (&plan.target_sprint_id, &plan.new_sprint) {
            (Some(_), Some(_)) => Err(SprintError::Validation(
                "Choose either an existing target sprint or a new sprint, not both".to_string(),
            )),
            (None, None) => Err(SprintError::Validation(
                "Selected tasks need a target sprint or a new sprint".to_string(),
            )),
            (Some(target_id), None) => {
                let target = self
                    .sprints
                    .find_sprint_by_id(target_id)?
                    .ok_or_else(|| SprintError::NotFound(format!("Sprint {}", target_id)))?;
                ensure_open_target(closing, &target)?;
                Ok(ResolvedPlan {
                    selected: plan.selected_task_ids.clone(),
                    target: Some(target.id),
                    created: None,
                })
            }
            (None, Some(spec)) => {
                let mut spec = spec.clone();
                if spec.project.trim().is_empty() {
                    spec.project = closing.project.clone();
                }
                let created = SprintFactory::new(self.sprints, self.name_prefix).create(&spec)?;
                dispatch(
                    self.dispatcher,
                    SprintEvent::SprintCreated {
                        sprint_id: created.id.clone(),
                        project: created.project.clone(),
                        name: created.name.clone(),
                    },
                );
                Ok(ResolvedPlan {
                    selected: plan.selected_task_ids.clone(),
                    target: Some(created.id.clone()),
                    created: Some(created),
                })
            }
        }
    }
}

/// A migration target must be a different sprint that is planning or active.
pub fn ensure_open_target(from: &Sprint, target: &Sprint) -> Result<()> {
    if target.id == from.id {
        return Err(SprintError::InvalidTarget(format!(
            "Sprint {} cannot receive its own tasks",
            target.id
        )));
    }
    if !target.is_open() {
        return Err(SprintError::InvalidTarget(format!(
            "Sprint {} is {}; tasks can only move into planning or active sprints",
            target.id, target.status
        )));
    }
    Ok(())
}
