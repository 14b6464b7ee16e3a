//! Sprint lifecycle engine.
//!
//! [`SprintService`] is the single entry point. It wires together:
//!
//! - [`SprintStateMachine`]: legal status transitions and the status
//!   compare-and-set every write goes through
//! - [`SprintFactory`]: validated creation with "Sprint N" auto-naming
//! - [`CompletionCoordinator`]: closing an active sprint and placing its
//!   unfinished work
//! - [`MigrationExecutor`]: one task's move to the backlog or another sprint
//! - [`NotificationDispatcher`]: best-effort lifecycle events
//!
//! Everything is synchronous and reads the stores fresh on every call.

mod completion;
mod events;
mod factory;
mod migration;
mod service;
mod state;
mod tasks;

pub use completion::{
    CompletionCoordinator, CompletionReport, IncompleteTask, MigrationPlan, TaskPartition,
    ensure_open_target,
};
pub use events::{
    ChannelDispatcher, NoopDispatcher, NotificationDispatcher, SprintEvent, TracingDispatcher,
    dispatch,
};
pub use factory::{DEFAULT_NAME_PREFIX, SprintFactory, SprintSpec, next_sprint_name};
pub use migration::{MigrationExecutor, MigrationTarget, MoveOutcome};
pub use service::{MigrationSummary, SprintService};
pub use state::SprintStateMachine;
pub use tasks::NewTask;
