use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Object, Schema};

use crate::error::SprintError;
use crate::lifecycle::{MigrationTarget, SprintService};
use crate::model::TaskStatus;

use super::types::*;

pub type SprintsSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub struct AppState {
    pub service: Arc<SprintService>,
    pub default_project: String,
    pub default_capacity: f64,
}

pub fn build_schema(
    service: Arc<SprintService>,
    default_project: String,
    default_capacity: f64,
) -> SprintsSchema {
    let state = Arc::new(AppState {
        service,
        default_project,
        default_capacity,
    });

    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

fn state<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<AppState>> {
    ctx.data::<Arc<AppState>>()
}

/// Carries `SprintError::kind()` as the `code` extension.
fn gql_error(err: SprintError) -> async_graphql::Error {
    let code = err.kind();
    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}

trait GqlResult<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> GqlResult<T> for crate::error::Result<T> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(gql_error)
    }
}

fn optional<T>(result: crate::error::Result<T>) -> async_graphql::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(SprintError::NotFound(_)) => Ok(None),
        Err(e) => Err(gql_error(e)),
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Get a single sprint by ID
    async fn sprint(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Option<Sprint>> {
        let state = state(ctx)?;
        Ok(optional(state.service.get_sprint(&id))?.map(Into::into))
    }

    /// List sprints, oldest first
    async fn sprints(
        &self,
        ctx: &Context<'_>,
        project: Option<String>,
        status: Option<SprintStatus>,
    ) -> async_graphql::Result<Vec<Sprint>> {
        let state = state(ctx)?;
        let mut sprints = state.service.list_sprints(project.as_deref()).gql()?;
        if let Some(status) = status {
            let status: crate::model::SprintStatus = status.into();
            sprints.retain(|s| s.status == status);
        }
        Ok(sprints.into_iter().map(Into::into).collect())
    }

    /// Unfinished, unarchived tasks of a sprint with their open subtasks
    async fn incomplete_tasks(
        &self,
        ctx: &Context<'_>,
        sprint_id: String,
    ) -> async_graphql::Result<Vec<IncompleteTask>> {
        let state = state(ctx)?;
        let tasks = state.service.get_incomplete_tasks(&sprint_id).gql()?;
        Ok(tasks.into_iter().map(Into::into).collect())
    }

    /// Tasks of a sprint, or the backlog when no sprint is given
    async fn tasks(
        &self,
        ctx: &Context<'_>,
        sprint_id: Option<String>,
    ) -> async_graphql::Result<Vec<Task>> {
        let state = state(ctx)?;
        let tasks = match sprint_id {
            Some(id) => state.service.sprint_tasks(&id).gql()?,
            None => state.service.backlog().gql()?,
        };
        Ok(tasks.into_iter().map(Into::into).collect())
    }

    async fn task(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Option<Task>> {
        let state = state(ctx)?;
        Ok(optional(state.service.get_task(&id))?.map(Into::into))
    }

    /// Live progress, or the frozen snapshot once the sprint is completed
    async fn progress(&self, ctx: &Context<'_>, sprint_id: String) -> async_graphql::Result<Progress> {
        let state = state(ctx)?;
        Ok(state.service.progress(&sprint_id).gql()?.into())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create a sprint in planning status
    async fn create_sprint(&self, ctx: &Context<'_>, input: SprintInput) -> async_graphql::Result<Sprint> {
        let state = state(ctx)?;
        let spec = input
            .into_spec(&state.default_project, state.default_capacity)
            .gql()?;
        Ok(state.service.create_sprint(&spec).gql()?.into())
    }

    async fn start_sprint(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Sprint> {
        let state = state(ctx)?;
        Ok(state.service.start_sprint(&id).gql()?.into())
    }

    /// Complete an active sprint. Without a plan every unfinished task goes to
    /// the backlog.
    async fn complete_sprint(
        &self,
        ctx: &Context<'_>,
        id: String,
        plan: Option<MigrationPlanInput>,
    ) -> async_graphql::Result<CompletionResult> {
        let state = state(ctx)?;
        let plan = plan
            .map(|p| p.into_plan(state.default_capacity))
            .transpose()
            .gql()?;
        let report = state.service.complete_sprint(&id, plan.as_ref()).gql()?;
        Ok(report.into())
    }

    async fn cancel_sprint(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Sprint> {
        let state = state(ctx)?;
        Ok(state.service.cancel_sprint(&id).gql()?.into())
    }

    /// Move tasks out of a sprint; the backlog when `toSprintId` is omitted
    async fn migrate_tasks(
        &self,
        ctx: &Context<'_>,
        from_sprint_id: String,
        task_ids: Vec<String>,
        to_sprint_id: Option<String>,
    ) -> async_graphql::Result<MigrationResult> {
        let state = state(ctx)?;
        let target = match to_sprint_id {
            Some(id) => MigrationTarget::Sprint(id),
            None => MigrationTarget::Backlog,
        };
        let summary = state
            .service
            .migrate_tasks(&from_sprint_id, &task_ids, &target)
            .gql()?;
        Ok(summary.into())
    }

    async fn create_task(&self, ctx: &Context<'_>, input: CreateTaskInput) -> async_graphql::Result<Task> {
        let state = state(ctx)?;
        let input = input.into_new_task(&state.default_project).gql()?;
        Ok(state.service.create_task(&input).gql()?.into())
    }

    async fn assign_task(
        &self,
        ctx: &Context<'_>,
        id: String,
        sprint_id: String,
    ) -> async_graphql::Result<Task> {
        let state = state(ctx)?;
        Ok(state.service.assign_task(&id, &sprint_id).gql()?.into())
    }

    async fn set_task_status(
        &self,
        ctx: &Context<'_>,
        id: String,
        status: String,
    ) -> async_graphql::Result<Task> {
        let state = state(ctx)?;
        let status = status.parse::<TaskStatus>().gql()?;
        Ok(state.service.set_task_status(&id, status).gql()?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn schema() -> SprintsSchema {
        let service = SprintService::with_store(Arc::new(MemoryStore::new()));
        build_schema(Arc::new(service), "web".to_string(), 40.0)
    }

    async fn run(schema: &SprintsSchema, query: &str) -> serde_json::Value {
        let response = schema.execute(query).await;
        serde_json::to_value(&response).unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_through_graphql() {
        let schema = schema();

        let created = run(
            &schema,
            r#"mutation { createSprint(input: { startDate: "2026-03-02", endDate: "2026-03-13" }) { id name status } }"#,
        )
        .await;
        assert_eq!(created["data"]["createSprint"]["name"], "Sprint 1");
        assert_eq!(created["data"]["createSprint"]["status"], "PLANNING");
        let sprint_id = created["data"]["createSprint"]["id"].as_str().unwrap().to_string();

        let task = run(
            &schema,
            &format!(
                r#"mutation {{ createTask(input: {{ title: "Login", sprint: "{}", subtasks: ["form"] }}) {{ id }} }}"#,
                sprint_id
            ),
        )
        .await;
        let task_id = task["data"]["createTask"]["id"].as_str().unwrap().to_string();

        run(&schema, &format!(r#"mutation {{ startSprint(id: "{}") {{ id }} }}"#, sprint_id)).await;

        let incomplete = run(
            &schema,
            &format!(
                r#"{{ incompleteTasks(sprintId: "{}") {{ taskId incompleteSubtasks {{ title }} }} }}"#,
                sprint_id
            ),
        )
        .await;
        assert_eq!(incomplete["data"]["incompleteTasks"][0]["taskId"], task_id.as_str());
        assert_eq!(
            incomplete["data"]["incompleteTasks"][0]["incompleteSubtasks"][0]["title"],
            "form"
        );

        let completed = run(
            &schema,
            &format!(
                r#"mutation {{ completeSprint(id: "{}") {{ sprint {{ status snapshot {{ totalTasks }} }} movedToBacklog partialFailures }} }}"#,
                sprint_id
            ),
        )
        .await;
        let result = &completed["data"]["completeSprint"];
        assert_eq!(result["sprint"]["status"], "COMPLETED");
        assert_eq!(result["sprint"]["snapshot"]["totalTasks"], 1);
        assert_eq!(result["movedToBacklog"][0], task_id.as_str());
        assert_eq!(result["partialFailures"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_errors_carry_code() {
        let schema = schema();
        let created = run(
            &schema,
            r#"mutation { createSprint(input: { startDate: "2026-03-02", endDate: "2026-03-13" }) { id } }"#,
        )
        .await;
        let sprint_id = created["data"]["createSprint"]["id"].as_str().unwrap().to_string();

        let started = run(&schema, &format!(r#"mutation {{ startSprint(id: "{}") {{ id }} }}"#, sprint_id)).await;
        assert_eq!(started["errors"][0]["extensions"]["code"], "NO_TASKS");

        let bad = run(
            &schema,
            r#"mutation { createSprint(input: { startDate: "2026-03-13", endDate: "2026-03-02" }) { id } }"#,
        )
        .await;
        assert_eq!(bad["errors"][0]["extensions"]["code"], "VALIDATION");

        let missing = run(&schema, r#"{ sprint(id: "sp-404") { id } }"#).await;
        assert!(missing["data"]["sprint"].is_null());
    }
}
