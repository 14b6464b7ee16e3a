use crate::graphql::{build_schema, run_server};
use anyhow::Result;

use super::CommandContext;

pub fn handle_serve(ctx: CommandContext, port: u16) -> Result<()> {
    let schema = build_schema(
        ctx.service,
        ctx.config.sprints.project.clone(),
        ctx.config.sprints.default_capacity,
    );

    println!("Starting GraphQL server on http://localhost:{}", port);
    println!("GraphiQL: http://localhost:{}", port);

    tokio::runtime::Runtime::new()?.block_on(async { run_server(schema, port).await })?;
    Ok(())
}
