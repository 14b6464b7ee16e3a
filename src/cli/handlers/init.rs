use crate::config::{CONFIG_FILE, DATA_DIR, IdMode, SprintSettings, SprintsConfig};
use anyhow::Result;
use colored::Colorize;

pub struct InitOptions {
    pub project: String,
    pub sprint_prefix: String,
    pub task_prefix: String,
    pub id_length: usize,
    pub sequential: bool,
    pub frontmatter: String,
    pub data_path: Option<String>,
}

pub fn handle_init(options: InitOptions) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE);

    if config_path.exists() {
        anyhow::bail!("Project already initialized at {}", config_path.display());
    }

    let config = SprintsConfig {
        sprints: SprintSettings {
            path: options.data_path.clone(),
            sprint_prefix: options.sprint_prefix,
            task_prefix: options.task_prefix,
            id_length: options.id_length,
            id_mode: if options.sequential {
                IdMode::Sequential
            } else {
                IdMode::Random
            },
            frontmatter: options.frontmatter,
            project: options.project,
            ..SprintSettings::default()
        },
        logging: Default::default(),
    };

    let data_path = cwd.join(options.data_path.as_deref().unwrap_or(DATA_DIR));
    std::fs::create_dir_all(data_path.join("sprints"))?;
    std::fs::create_dir_all(data_path.join("tasks"))?;

    config.save(&config_path)?;

    println!(
        "{} sprints project in {}",
        "Initialized".green(),
        cwd.display()
    );
    println!("  Config: {}", config_path.display());
    println!("  Data:   {}", data_path.display());

    Ok(())
}
