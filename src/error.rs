use thiserror::Error;

#[derive(Error, Debug)]
pub enum SprintError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Sprint {0} has no tasks assigned and cannot be started")]
    NoTasks(String),

    #[error("Invalid migration target: {0}")]
    InvalidTarget(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Migration failed for {} task(s): {}", .0.len(), .0.join(", "))]
    PartialFailure(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Project not initialized. Run 'sprints init' first.")]
    NotInitialized,

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(String),
}

impl SprintError {
    /// Stable machine-readable code, surfaced as the GraphQL `code` extension.
    pub fn kind(&self) -> &'static str {
        match self {
            SprintError::Validation(_) => "VALIDATION",
            SprintError::NotFound(_) => "NOT_FOUND",
            SprintError::InvalidState(_) => "INVALID_STATE",
            SprintError::NoTasks(_) => "NO_TASKS",
            SprintError::InvalidTarget(_) => "INVALID_TARGET",
            SprintError::Conflict(_) => "CONFLICT",
            SprintError::PartialFailure(_) => "PARTIAL_FAILURE",
            SprintError::NotInitialized | SprintError::AlreadyInitialized(_) => "NOT_INITIALIZED",
            _ => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, SprintError>;
