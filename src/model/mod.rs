//! Data models for sprints.
//!
//! This module defines the core data structures:
//!
//! - [`Sprint`]: A time-boxed container of work for one project
//! - [`SprintStatus`]: Lifecycle states (planning, active, completed, cancelled)
//! - [`Task`]: A unit of work, optionally assigned to a sprint
//! - [`Subtask`]: A checklist item embedded in a task
//! - [`TaskStatus`]: Project-defined workflow status
//! - [`SprintAssignment`]: The sprint membership and provenance fields of a task

mod sprint;
mod task;
mod types;

pub use sprint::{ProgressSnapshot, Sprint, SprintPatch};
pub use task::{Subtask, SprintAssignment, Task};
pub use types::{COMPLETE_STATUSES, SprintStatus, TaskStatus};
