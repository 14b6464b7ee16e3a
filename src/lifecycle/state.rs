//! Sprint status transitions.
//!
//! ```text
//! planning ──start──▶ active ──complete──▶ completed
//!     │                  │
//!     └──────cancel──────┴──────────────▶ cancelled
//! ```
//!
//! Every status write goes through [`SprintStateMachine::commit`], which hands the
//! store the status it observed. A writer that lost a race gets
//! `SprintError::Conflict` back instead of silently overwriting.

use crate::error::{Result, SprintError};
use crate::model::{Sprint, SprintPatch, SprintStatus};
use crate::storage::{SprintStore, TaskStore};
use chrono::Utc;

pub struct SprintStateMachine<'a> {
    sprints: &'a dyn SprintStore,
    tasks: &'a dyn TaskStore,
}

impl<'a> SprintStateMachine<'a> {
    pub fn new(sprints: &'a dyn SprintStore, tasks: &'a dyn TaskStore) -> Self {
        Self { sprints, tasks }
    }

    pub fn load(&self, sprint_id: &str) -> Result<Sprint> {
        self.sprints
            .find_sprint_by_id(sprint_id)?
            .ok_or_else(|| SprintError::NotFound(format!("Sprint {}", sprint_id)))
    }

    /// Rejects any edge not in the transition table.
    pub fn check_transition(sprint: &Sprint, next: SprintStatus) -> Result<()> {
        if sprint.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(SprintError::InvalidState(format!(
                "Sprint {} is {} and cannot become {}",
                sprint.id, sprint.status, next
            )))
        }
    }

    /// Writes `patch` if the sprint is still in the status `sprint` was read with.
    pub fn commit(&self, sprint: &Sprint, patch: SprintPatch) -> Result<Sprint> {
        Self::check_transition(sprint, patch.status)?;
        self.sprints
            .update_sprint_status(&sprint.id, sprint.status, &patch)
    }

    /// planning → active. The sprint must have at least one task assigned.
    pub fn start(&self, sprint_id: &str) -> Result<Sprint> {
        let sprint = self.load(sprint_id)?;
        if sprint.status != SprintStatus::Planning {
            return Err(SprintError::InvalidState(format!(
                "Sprint {} is {}; only planning sprints can be started",
                sprint.id, sprint.status
            )));
        }

        let assigned = self.tasks.find_tasks_by_sprint(sprint_id)?;
        if assigned.is_empty() {
            return Err(SprintError::NoTasks(sprint.id));
        }

        tracing::info!(sprint = %sprint.id, tasks = assigned.len(), "Starting sprint");
        self.commit(
            &sprint,
            SprintPatch::status(SprintStatus::Active).with_actual_start(Utc::now()),
        )
    }

    /// planning | active → cancelled. Assigned tasks stay where they are.
    pub fn cancel(&self, sprint_id: &str) -> Result<Sprint> {
        let sprint = self.load(sprint_id)?;
        Self::check_transition(&sprint, SprintStatus::Cancelled)?;

        tracing::info!(sprint = %sprint.id, from = %sprint.status, "Cancelling sprint");
        self.commit(
            &sprint,
            SprintPatch::status(SprintStatus::Cancelled).with_actual_end(Utc::now()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn seed(store: &MemoryStore, id: &str, status: SprintStatus) {
        let mut sprint = Sprint::new(
            id.to_string(),
            "web".to_string(),
            "Sprint 1".to_string(),
            NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 15).unwrap(),
        );
        sprint.status = status;
        store.insert_sprint(&sprint).unwrap();
    }

    fn assign(store: &MemoryStore, task_id: &str, sprint_id: &str) {
        store
            .insert_task(
                &Task::new(task_id.into(), "work".into(), "web".into())
                    .with_sprint(Some(sprint_id.into())),
            )
            .unwrap();
    }

    #[test]
    fn test_start_sets_actual_start() {
        let store = MemoryStore::new();
        seed(&store, "sp-1", SprintStatus::Planning);
        assign(&store, "tk-1", "sp-1");

        let machine = SprintStateMachine::new(&store, &store);
        let started = machine.start("sp-1").unwrap();

        assert_eq!(started.status, SprintStatus::Active);
        assert!(started.actual_start.is_some());
        assert!(started.actual_end.is_none());
    }

    #[test]
    fn test_start_without_tasks_leaves_planning() {
        let store = MemoryStore::new();
        seed(&store, "sp-1", SprintStatus::Planning);

        let machine = SprintStateMachine::new(&store, &store);
        let result = machine.start("sp-1");

        assert!(matches!(result, Err(SprintError::NoTasks(_))));
        assert_eq!(machine.load("sp-1").unwrap().status, SprintStatus::Planning);
    }

    #[test]
    fn test_start_rejects_non_planning() {
        let store = MemoryStore::new();
        for (id, status) in [
            ("sp-a", SprintStatus::Active),
            ("sp-c", SprintStatus::Completed),
            ("sp-x", SprintStatus::Cancelled),
        ] {
            seed(&store, id, status);
            assign(&store, &format!("tk-{}", id), id);
        }

        let machine = SprintStateMachine::new(&store, &store);
        for id in ["sp-a", "sp-c", "sp-x"] {
            assert!(matches!(
                machine.start(id),
                Err(SprintError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_start_missing_sprint() {
        let store = MemoryStore::new();
        let machine = SprintStateMachine::new(&store, &store);
        assert!(matches!(
            machine.start("sp-404"),
            Err(SprintError::NotFound(_))
        ));
    }

    #[test]
    fn test_cancel_from_planning_and_active_only() {
        let store = MemoryStore::new();
        seed(&store, "sp-p", SprintStatus::Planning);
        seed(&store, "sp-a", SprintStatus::Active);
        seed(&store, "sp-c", SprintStatus::Completed);

        let machine = SprintStateMachine::new(&store, &store);
        assert_eq!(
            machine.cancel("sp-p").unwrap().status,
            SprintStatus::Cancelled
        );
        assert_eq!(
            machine.cancel("sp-a").unwrap().status,
            SprintStatus::Cancelled
        );
        assert!(matches!(
            machine.cancel("sp-c"),
            Err(SprintError::InvalidState(_))
        ));
        assert!(matches!(
            machine.cancel("sp-p"),
            Err(SprintError::InvalidState(_))
        ));
    }

    #[test]
    fn test_commit_with_stale_read_conflicts() {
        let store = MemoryStore::new();
        seed(&store, "sp-1", SprintStatus::Active);

        let machine = SprintStateMachine::new(&store, &store);
        let stale = machine.load("sp-1").unwrap();
        machine.cancel("sp-1").unwrap();

        let result = machine.commit(&stale, SprintPatch::status(SprintStatus::Completed));
        assert!(matches!(result, Err(SprintError::Conflict(_))));
    }
}
