//! Storage layer for sprints and tasks.
//!
//! The lifecycle engine only talks to the [`SprintStore`] and [`TaskStore`]
//! traits. Two implementations ship with the crate:
//!
//! - [`FileStore`]: markdown files with TOML or YAML frontmatter under `.sprints/`
//! - [`MemoryStore`]: mutex-guarded maps, for tests and embedding
//!
//! ## File Format
//!
//! ```markdown
//! +++
//! id = "tk-00017"
//! title = "Fix login redirect"
//! project = "web"
//! sprint = "sp-00004"
//! status = "review"
//! moved_to_backlog = false
//! +++
//!
//! Description of the task.
//! ```

mod markdown;
mod memory;
mod repository;
mod store;

pub use markdown::{Document, FrontmatterFormat, detect_format, parse_document, render_document};
pub use memory::MemoryStore;
pub use repository::FileStore;
pub use store::{SprintStore, TaskStore};
