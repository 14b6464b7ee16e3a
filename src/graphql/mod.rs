//! GraphQL schema and resolvers for sprints.
//!
//! Exposes the same lifecycle operations as the CLI, for dashboards and
//! automation.
//!
//! ## Usage
//!
//! ```bash
//! # Start the GraphQL server (GraphiQL on GET /)
//! sprints serve --port 4000
//!
//! # Execute a document from the CLI
//! sprints query '{ sprints(status: ACTIVE) { id name } }'
//! sprints query 'mutation { completeSprint(id: "sp-ab12c") { partialFailures } }'
//! ```
//!
//! ## Schema
//!
//! - **Queries**: `sprint`, `sprints`, `incompleteTasks`, `tasks`, `task`, `progress`
//! - **Mutations**: `createSprint`, `startSprint`, `completeSprint`, `cancelSprint`,
//!   `migrateTasks`, `createTask`, `assignTask`, `setTaskStatus`
//!
//! Errors carry a `code` extension (`NOT_FOUND`, `INVALID_STATE`, `NO_TASKS`,
//! `INVALID_TARGET`, `CONFLICT`, `VALIDATION`, ...).

mod schema;
mod types;

pub use schema::{AppState, MutationRoot, QueryRoot, SprintsSchema, build_schema};
pub use types::*;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::GraphQL;
use axum::{
    Router,
    response::{Html, IntoResponse},
    routing::get,
};

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/").finish())
}

pub fn router(schema: SprintsSchema) -> Router {
    Router::new().route("/", get(graphiql).post_service(GraphQL::new(schema)))
}

/// Serves `schema` on `0.0.0.0:<port>` until the process is stopped.
pub async fn run_server(schema: SprintsSchema, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "GraphQL server listening");
    axum::serve(listener, router(schema)).await
}
