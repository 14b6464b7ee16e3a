use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use sprints::cli::handlers::{
    CommandContext, InitOptions, handle_init, handle_query, handle_serve, handle_sprint,
    handle_task,
};
use sprints::cli::{Cli, Commands};
use sprints::config::SprintsConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init {
        project,
        sprint_prefix,
        task_prefix,
        id_length,
        sequential,
        frontmatter,
    } = cli.command
    {
        let _guard = sprints::logging::init(cli.verbose, cli.log_file.map(PathBuf::from));
        return handle_init(InitOptions {
            project,
            sprint_prefix,
            task_prefix,
            id_length,
            sequential,
            frontmatter: frontmatter.as_str().to_string(),
            data_path: cli.data_path,
        });
    }

    let (mut config, root) = load_config(cli.config.as_deref())?;
    if let Some(path) = cli.data_path {
        config.sprints.path = Some(path);
    }

    let log_file = cli
        .log_file
        .map(PathBuf::from)
        .or_else(|| config.log_path(&root));
    let _guard = sprints::logging::init(cli.verbose || config.logging.verbose, log_file);
    tracing::debug!(root = %root.display(), "Loaded configuration");

    let ctx = CommandContext::new(config, root);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Sprint { action } => handle_sprint(&ctx, action),
        Commands::Task { action } => handle_task(&ctx, action),
        Commands::Query { query, variables } => handle_query(ctx, query, variables),
        Commands::Serve { port } => handle_serve(ctx, port),
    }
}

fn load_config(config_path: Option<&str>) -> Result<(SprintsConfig, PathBuf)> {
    match config_path {
        Some(path) => SprintsConfig::load_from(&PathBuf::from(path))
            .with_context(|| format!("Failed to load configuration from {}", path)),
        None => {
            let cwd = std::env::current_dir()?;
            SprintsConfig::load(&cwd).context("Failed to load sprints configuration")
        }
    }
}
