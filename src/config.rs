use crate::error::{Result, SprintError};
use crate::storage::FrontmatterFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".sprints.toml";
pub const DATA_DIR: &str = ".sprints";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SprintsConfig {
    #[serde(default)]
    pub sprints: SprintSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintSettings {
    /// Data directory, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default = "default_sprint_prefix")]
    pub sprint_prefix: String,

    #[serde(default = "default_task_prefix")]
    pub task_prefix: String,

    #[serde(default = "default_id_length")]
    pub id_length: usize,

    #[serde(default)]
    pub id_mode: IdMode,

    #[serde(default = "default_frontmatter")]
    pub frontmatter: String,

    /// Project reference used when a command doesn't name one.
    #[serde(default = "default_project")]
    pub project: String,

    #[serde(default = "default_capacity")]
    pub default_capacity: f64,

    #[serde(default = "default_length_days")]
    pub default_length_days: i64,

    /// Prefix used for auto-numbered sprint names ("Sprint 7").
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
}

fn default_sprint_prefix() -> String {
    "sp-".to_string()
}

fn default_task_prefix() -> String {
    "tk-".to_string()
}

fn default_id_length() -> usize {
    5
}

fn default_frontmatter() -> String {
    "toml".to_string()
}

fn default_project() -> String {
    "default".to_string()
}

fn default_capacity() -> f64 {
    40.0
}

fn default_length_days() -> i64 {
    14
}

fn default_name_prefix() -> String {
    "Sprint".to_string()
}

impl Default for SprintSettings {
    fn default() -> Self {
        Self {
            path: None,
            sprint_prefix: default_sprint_prefix(),
            task_prefix: default_task_prefix(),
            id_length: default_id_length(),
            id_mode: IdMode::default(),
            frontmatter: default_frontmatter(),
            project: default_project(),
            default_capacity: default_capacity(),
            default_length_days: default_length_days(),
            name_prefix: default_name_prefix(),
        }
    }
}

impl SprintSettings {
    pub fn frontmatter_format(&self) -> FrontmatterFormat {
        match self.frontmatter.as_str() {
            "yaml" | "yml" => FrontmatterFormat::Yaml,
            _ => FrontmatterFormat::Toml,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Rolling JSON log file. Logs go to stderr only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default)]
    pub verbose: bool,
}

impl SprintsConfig {
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = Self::find_config_file(start_path)?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<(Self, PathBuf)> {
        let content = std::fs::read_to_string(config_path)?;
        let config: SprintsConfig = toml::from_str(&content)?;
        let project_root = config_path
            .parent()
            .ok_or_else(|| SprintError::Config("Config file has no parent directory".to_string()))?
            .to_path_buf();
        Ok((config, project_root))
    }

    pub fn find_config_file(start_path: &Path) -> Result<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return Ok(config_path);
            }
            if !current.pop() {
                return Err(SprintError::NotInitialized);
            }
        }
    }

    pub fn data_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.sprints.path.as_deref().unwrap_or(DATA_DIR))
    }

    pub fn log_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.logging.file.as_ref().map(|f| project_root.join(f))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
