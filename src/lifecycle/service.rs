use super::completion::{
    CompletionCoordinator, CompletionReport, IncompleteTask, MigrationPlan, TaskPartition,
    ensure_open_target,
};
use super::events::{NotificationDispatcher, SprintEvent, TracingDispatcher, dispatch};
use super::factory::{DEFAULT_NAME_PREFIX, SprintFactory, SprintSpec};
use super::migration::{MigrationExecutor, MigrationTarget, MoveOutcome};
use super::state::SprintStateMachine;
use crate::error::Result;
use crate::model::{ProgressSnapshot, Sprint, SprintStatus, Task};
use crate::storage::{SprintStore, TaskStore};
use serde::Serialize;
use std::sync::Arc;

/// Result of a caller-driven migration, typically a retry after a partial
/// failure during completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationSummary {
    pub moved: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Entry point for every lifecycle operation. Both the CLI and the GraphQL
/// schema go through this type.
pub struct SprintService {
    pub(super) sprints: Arc<dyn SprintStore>,
    pub(super) tasks: Arc<dyn TaskStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    name_prefix: String,
}

impl SprintService {
    pub fn new(sprints: Arc<dyn SprintStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self {
            sprints,
            tasks,
            dispatcher: Arc::new(TracingDispatcher),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }

    /// Uses one store for both sprints and tasks.
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: SprintStore + TaskStore + 'static,
    {
        let sprints: Arc<dyn SprintStore> = store.clone();
        let tasks: Arc<dyn TaskStore> = store;
        Self::new(sprints, tasks)
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    fn machine(&self) -> SprintStateMachine<'_> {
        SprintStateMachine::new(self.sprints.as_ref(), self.tasks.as_ref())
    }

    fn coordinator(&self) -> CompletionCoordinator<'_> {
        CompletionCoordinator::new(
            self.sprints.as_ref(),
            self.tasks.as_ref(),
            self.dispatcher.as_ref(),
            &self.name_prefix,
        )
    }

    pub fn create_sprint(&self, spec: &SprintSpec) -> Result<Sprint> {
        let sprint = SprintFactory::new(self.sprints.as_ref(), &self.name_prefix).create(spec)?;
        dispatch(
            self.dispatcher.as_ref(),
            SprintEvent::SprintCreated {
                sprint_id: sprint.id.clone(),
                project: sprint.project.clone(),
                name: sprint.name.clone(),
            },
        );
        Ok(sprint)
    }

    pub fn start_sprint(&self, sprint_id: &str) -> Result<Sprint> {
        let sprint = self.machine().start(sprint_id)?;
        let task_count = self.tasks.find_tasks_by_sprint(&sprint.id)?.len();
        dispatch(
            self.dispatcher.as_ref(),
            SprintEvent::SprintStarted {
                sprint_id: sprint.id.clone(),
                project: sprint.project.clone(),
                task_count,
            },
        );
        Ok(sprint)
    }

    pub fn cancel_sprint(&self, sprint_id: &str) -> Result<Sprint> {
        let sprint = self.machine().cancel(sprint_id)?;
        dispatch(
            self.dispatcher.as_ref(),
            SprintEvent::SprintCancelled {
                sprint_id: sprint.id.clone(),
                project: sprint.project.clone(),
            },
        );
        Ok(sprint)
    }

    pub fn get_incomplete_tasks(&self, sprint_id: &str) -> Result<Vec<IncompleteTask>> {
        self.coordinator().incomplete_tasks(sprint_id)
    }

    /// Closes an active sprint. Only one completion per sprint runs at a time,
    /// across every service sharing the store; a concurrent call fails with
    /// `Conflict` before reading any task.
    pub fn complete_sprint(
        &self,
        sprint_id: &str,
        plan: Option<&MigrationPlan>,
    ) -> Result<CompletionReport> {
        self.coordinator().complete(sprint_id, plan)
    }

    /// Moves the given tasks out of `from_sprint_id`. Tasks that already left
    /// are skipped and per-task failures are collected.
    pub fn migrate_tasks(
        &self,
        from_sprint_id: &str,
        task_ids: &[String],
        target: &MigrationTarget,
    ) -> Result<MigrationSummary> {
        let from = self.machine().load(from_sprint_id)?;
        if let MigrationTarget::Sprint(target_id) = target {
            let to = self.machine().load(target_id)?;
            ensure_open_target(&from, &to)?;
        }

        let executor = MigrationExecutor::new(self.tasks.as_ref());
        let mut summary = MigrationSummary::default();
        for task_id in task_ids {
            match executor.move_if_assigned(task_id, &from.id, target) {
                Ok(MoveOutcome::Moved(_)) => summary.moved.push(task_id.clone()),
                Ok(MoveOutcome::Skipped) => summary.skipped.push(task_id.clone()),
                Err(e) => {
                    tracing::warn!(task = %task_id, from = %from.id, error = %e, "Task migration failed");
                    summary.failed.push(task_id.clone());
                }
            }
        }
        tracing::info!(
            from = %from.id,
            to = %target,
            moved = summary.moved.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Migrated tasks"
        );
        Ok(summary)
    }

    pub fn get_sprint(&self, sprint_id: &str) -> Result<Sprint> {
        self.machine().load(sprint_id)
    }

    pub fn list_sprints(&self, project: Option<&str>) -> Result<Vec<Sprint>> {
        self.sprints.list_sprints(project)
    }

    pub fn sprint_tasks(&self, sprint_id: &str) -> Result<Vec<Task>> {
        self.machine().load(sprint_id)?;
        self.tasks.find_tasks_by_sprint(sprint_id)
    }

    /// Frozen snapshot for a completed sprint, live counts otherwise.
    pub fn progress(&self, sprint_id: &str) -> Result<ProgressSnapshot> {
        let sprint = self.machine().load(sprint_id)?;
        if sprint.status == SprintStatus::Completed
            && let Some(snapshot) = sprint.snapshot
        {
            return Ok(snapshot);
        }
        let partition = TaskPartition::new(self.tasks.find_tasks_by_sprint(sprint_id)?);
        Ok(partition.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SprintError;
    use crate::lifecycle::events::ChannelDispatcher;
    use crate::model::TaskStatus;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::mpsc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service() -> (Arc<MemoryStore>, SprintService) {
        let store = Arc::new(MemoryStore::new());
        let service = SprintService::with_store(store.clone());
        (store, service)
    }

    fn spec() -> SprintSpec {
        SprintSpec::new("web", date("2026-03-02"), date("2026-03-13"))
    }

    #[test]
    fn test_full_lifecycle_emits_events() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel();
        let service = SprintService::with_store(store.clone())
            .with_dispatcher(Arc::new(ChannelDispatcher::new(tx)));

        let sprint = service.create_sprint(&spec()).unwrap();
        store
            .insert_task(
                &Task::new("tk-a".into(), "Login".into(), "web".into())
                    .with_sprint(Some(sprint.id.clone())),
            )
            .unwrap();
        service.start_sprint(&sprint.id).unwrap();
        service.complete_sprint(&sprint.id, None).unwrap();

        let names: Vec<_> = rx.try_iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["sprint_created", "sprint_started", "sprint_completed"]
        );
    }

    #[test]
    fn test_held_lease_blocks_completion() {
        let (store, service) = service();
        let sprint = service.create_sprint(&spec()).unwrap();
        store
            .insert_task(
                &Task::new("tk-a".into(), "Login".into(), "web".into())
                    .with_sprint(Some(sprint.id.clone())),
            )
            .unwrap();
        service.start_sprint(&sprint.id).unwrap();

        store.acquire_completion_lease(&sprint.id).unwrap();
        assert!(matches!(
            service.complete_sprint(&sprint.id, None),
            Err(SprintError::Conflict(_))
        ));
        let untouched = store.find_task_by_id("tk-a").unwrap().unwrap();
        assert_eq!(untouched.sprint.as_deref(), Some(sprint.id.as_str()));

        store.release_completion_lease(&sprint.id).unwrap();
        let report = service.complete_sprint(&sprint.id, None).unwrap();
        assert_eq!(report.sprint.status, SprintStatus::Completed);
        // The lease is released after a successful completion too.
        store.acquire_completion_lease(&sprint.id).unwrap();
    }

    #[test]
    fn test_progress_live_then_frozen() {
        let (store, service) = service();
        let sprint = service.create_sprint(&spec()).unwrap();
        let task = store
            .insert_task(
                &Task::new("tk-a".into(), "Login".into(), "web".into())
                    .with_sprint(Some(sprint.id.clone()))
                    .with_story_points(Some(3)),
            )
            .unwrap();
        store
            .insert_task(
                &Task::new("tk-b".into(), "Logout".into(), "web".into())
                    .with_sprint(Some(sprint.id.clone()))
                    .with_status(TaskStatus::done())
                    .with_story_points(Some(2)),
            )
            .unwrap();

        let live = service.progress(&sprint.id).unwrap();
        assert_eq!(live.tasks_completed, 1);
        assert_eq!(live.total_story_points, 5);

        service.start_sprint(&sprint.id).unwrap();
        service.complete_sprint(&sprint.id, None).unwrap();

        let mut edited = store.find_task_by_id(&task.id).unwrap().unwrap();
        edited.status = TaskStatus::done();
        store.save_task(&edited).unwrap();

        let frozen = service.progress(&sprint.id).unwrap();
        assert_eq!(frozen.tasks_completed, 1);
        assert_eq!(frozen.total_tasks, 2);
    }

    #[test]
    fn test_migrate_tasks_retry() {
        let (store, service) = service();
        let from = service.create_sprint(&spec()).unwrap();
        let to = service.create_sprint(&spec()).unwrap();
        for id in ["tk-a", "tk-b"] {
            store
                .insert_task(
                    &Task::new(id.into(), id.into(), "web".into())
                        .with_sprint(Some(from.id.clone())),
                )
                .unwrap();
        }
        store
            .insert_task(&Task::new("tk-c".into(), "c".into(), "web".into()))
            .unwrap();

        let ids = vec!["tk-a".to_string(), "tk-b".to_string(), "tk-c".to_string()];
        let summary = service
            .migrate_tasks(&from.id, &ids, &MigrationTarget::Sprint(to.id.clone()))
            .unwrap();
        assert_eq!(summary.moved, vec!["tk-a", "tk-b"]);
        assert_eq!(summary.skipped, vec!["tk-c"]);
        assert!(summary.failed.is_empty());

        let again = service
            .migrate_tasks(&from.id, &ids, &MigrationTarget::Sprint(to.id.clone()))
            .unwrap();
        assert!(again.moved.is_empty());
        assert_eq!(again.skipped.len(), 3);
    }

    #[test]
    fn test_migrate_tasks_rejects_closed_target() {
        let (_store, service) = service();
        let from = service.create_sprint(&spec()).unwrap();
        let to = service.create_sprint(&spec()).unwrap();
        service.cancel_sprint(&to.id).unwrap();

        let result = service.migrate_tasks(
            &from.id,
            &["tk-a".to_string()],
            &MigrationTarget::Sprint(to.id.clone()),
        );
        assert!(matches!(result, Err(SprintError::InvalidTarget(_))));
    }
}
