mod init;
mod query;
mod serve;
mod sprint;
mod task;
mod utils;

pub use init::{InitOptions, handle_init};
pub use query::handle_query;
pub use serve::handle_serve;
pub use sprint::handle_sprint;
pub use task::handle_task;

use crate::config::SprintsConfig;
use crate::lifecycle::SprintService;
use crate::storage::FileStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Common context passed to all command handlers
pub struct CommandContext {
    pub config: SprintsConfig,
    pub root: PathBuf,
    pub service: Arc<SprintService>,
}

impl CommandContext {
    pub fn new(config: SprintsConfig, root: PathBuf) -> Self {
        let store = Arc::new(FileStore::new(&config, &root));
        let service = SprintService::with_store(store)
            .with_name_prefix(config.sprints.name_prefix.clone());
        Self {
            config,
            root,
            service: Arc::new(service),
        }
    }
}
