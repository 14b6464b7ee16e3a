use crate::graphql::build_schema;
use anyhow::Result;

use super::CommandContext;

/// Runs a query or mutation document against the local project and prints
/// the GraphQL response.
pub fn handle_query(ctx: CommandContext, query: String, variables: Option<String>) -> Result<()> {
    let schema = build_schema(
        ctx.service,
        ctx.config.sprints.project.clone(),
        ctx.config.sprints.default_capacity,
    );

    let vars: async_graphql::Variables = if let Some(v) = variables {
        serde_json::from_str(&v)?
    } else {
        async_graphql::Variables::default()
    };

    let request = async_graphql::Request::new(query).variables(vars);
    let response = tokio::runtime::Runtime::new()?.block_on(schema.execute(request));

    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.is_err() {
        anyhow::bail!("GraphQL request returned {} error(s)", response.errors.len());
    }
    Ok(())
}
